use serde::Serialize;

use super::domain::{AnswerRecord, AssessmentResult};
use super::store::{SessionHandoff, SessionId, SessionStore, StoreError};

/// Youngest skin age the transformation projection will ever show.
const PROJECTION_FLOOR_AGE: i32 = 25;
/// Years below chronological age the projection settles at.
const PROJECTION_TARGET_GAP: i32 = 3;
/// `(month, years below the current skin age)` before the target is reached.
const PROJECTION_STEPS: [(u32, i32); 5] = [(0, 0), (1, 1), (2, 3), (3, 5), (6, 8)];
const PROJECTION_TARGET_MONTHS: [u32; 2] = [9, 12];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FunnelPage {
    Entry,
    Results,
    PrimaryAssessment,
    AnalysisResults,
    ViviaTransformation,
    ReversalProtocol,
}

impl FunnelPage {
    pub const ALL: [FunnelPage; 6] = [
        Self::Entry,
        Self::Results,
        Self::PrimaryAssessment,
        Self::AnalysisResults,
        Self::ViviaTransformation,
        Self::ReversalProtocol,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Self::Entry => "/",
            Self::Results => "/results",
            Self::PrimaryAssessment => "/primary-assessment",
            Self::AnalysisResults => "/analysis-results",
            Self::ViviaTransformation => "/vivia-transformation",
            Self::ReversalProtocol => "/reversal-protocol",
        }
    }

    /// Path segment used by the page API; the entry page is `entry`.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Entry => "entry",
            other => other.path().trim_start_matches('/'),
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        let slug = slug.trim_matches('/');
        let slug = if slug.is_empty() { "entry" } else { slug };
        Self::ALL.into_iter().find(|page| page.slug() == slug)
    }

    /// Following page, or `None` when the funnel continues to the external sales page.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Entry => Some(Self::Results),
            Self::Results => Some(Self::PrimaryAssessment),
            Self::PrimaryAssessment => Some(Self::AnalysisResults),
            Self::AnalysisResults => Some(Self::ViviaTransformation),
            Self::ViviaTransformation => Some(Self::ReversalProtocol),
            Self::ReversalProtocol => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionPoint {
    pub month: u32,
    pub skin_age: i32,
    pub label: String,
}

/// Everything a result page needs to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    pub page: FunnelPage,
    pub next: String,
    pub assessment: AssessmentResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questionnaire: Option<AnswerRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection: Option<Vec<ProjectionPoint>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageResolution {
    /// The entry page: the session was reset and the user starts the questionnaire.
    Start { next: FunnelPage },
    Render(Box<PageView>),
    Redirect(FunnelPage),
}

/// Decides what each funnel page shows for a session.
pub struct FunnelNavigator<S> {
    handoff: SessionHandoff<S>,
    sales_page_url: String,
}

impl<S: SessionStore> FunnelNavigator<S> {
    pub fn new(handoff: SessionHandoff<S>, sales_page_url: impl Into<String>) -> Self {
        Self {
            handoff,
            sales_page_url: sales_page_url.into(),
        }
    }

    pub fn sales_page_url(&self) -> &str {
        &self.sales_page_url
    }

    pub fn resolve(
        &self,
        session: &SessionId,
        page: FunnelPage,
    ) -> Result<PageResolution, StoreError> {
        if page == FunnelPage::Entry {
            self.handoff.reset(session)?;
            return Ok(PageResolution::Start {
                next: FunnelPage::Results,
            });
        }

        let Some(assessment) = self.handoff.assessment(session)? else {
            return Ok(PageResolution::Redirect(FunnelPage::Entry));
        };

        let next = page
            .next()
            .map(|next| next.path().to_string())
            .unwrap_or_else(|| self.sales_page_url.clone());
        let projection = (page == FunnelPage::PrimaryAssessment).then(|| {
            project_skin_age(assessment.assessed_skin_age, assessment.chronological_age)
        });

        Ok(PageResolution::Render(Box::new(PageView {
            page,
            next,
            questionnaire: self.handoff.answers(session)?,
            uploaded_image: self.handoff.uploaded_image(session)?,
            projection,
            assessment,
        })))
    }
}

/// Twelve-month skin-age trajectory shown on the primary assessment page.
pub fn project_skin_age(skin_age: i32, chronological_age: i32) -> Vec<ProjectionPoint> {
    // A skin age already below the goal settles where it is.
    let target = chronological_age
        .saturating_sub(PROJECTION_TARGET_GAP)
        .max(PROJECTION_FLOOR_AGE)
        .min(skin_age);

    let stepped = PROJECTION_STEPS.into_iter().map(|(month, drop)| {
        let age = if month == 0 {
            skin_age
        } else {
            skin_age.saturating_sub(drop).max(target)
        };
        (month, age)
    });
    let settled = PROJECTION_TARGET_MONTHS
        .into_iter()
        .map(|month| (month, target));

    stepped
        .chain(settled)
        .map(|(month, skin_age)| ProjectionPoint {
            month,
            skin_age,
            label: match month {
                0 => "Current".to_string(),
                month => format!("Month {month}"),
            },
        })
        .collect()
}
