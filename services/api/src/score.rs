use clap::Args;
use skin_assess::error::AppError;
use skin_assess::workflows::assessment::questionnaire::RawAge;
use skin_assess::workflows::assessment::{
    AnswerRecord, AssessmentResult, FallbackScorer, QuestionnaireImporter,
    QuestionnaireSubmission,
};
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct ScoreArgs {
    /// CSV export of questionnaire rows to score in bulk
    #[arg(long, conflicts_with_all = ["age", "sleep_quality", "stress_level", "period_status"])]
    pub(crate) csv: Option<PathBuf>,
    /// Age in years or an age range such as 41-45
    #[arg(long)]
    pub(crate) age: Option<String>,
    /// excellent, good, fair, or poor
    #[arg(long)]
    pub(crate) sleep_quality: Option<String>,
    /// low, moderate, or high
    #[arg(long)]
    pub(crate) stress_level: Option<String>,
    /// regular, irregular, stopped, or hrt
    #[arg(long)]
    pub(crate) period_status: Option<String>,
    /// low, moderate, or high
    #[arg(long)]
    pub(crate) sun_exposure: Option<String>,
    /// Free-text hormone status
    #[arg(long)]
    pub(crate) hormone_status: Option<String>,
    /// Skincare product in use (repeatable)
    #[arg(long)]
    pub(crate) routine: Vec<String>,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let scored = score_answers(args)?;
    let rendered = match scored.as_slice() {
        [single] => serde_json::to_string_pretty(single),
        many => serde_json::to_string_pretty(many),
    };
    let rendered = rendered.map_err(|err| AppError::Io(err.into()))?;

    println!("{rendered}");
    Ok(())
}

fn score_answers(args: ScoreArgs) -> Result<Vec<AssessmentResult>, AppError> {
    let answers = match args.csv {
        Some(path) => QuestionnaireImporter::from_path(path)?,
        None => vec![inline_answers(args)?],
    };

    let scorer = FallbackScorer::standard();
    Ok(answers.iter().map(|record| scorer.score(record)).collect())
}

fn inline_answers(args: ScoreArgs) -> Result<AnswerRecord, AppError> {
    let submission = QuestionnaireSubmission {
        age: args.age.map(RawAge::Text),
        sleep_quality: args.sleep_quality,
        stress_level: args.stress_level,
        period_status: args.period_status,
        skincare_routine: args.routine,
        sun_exposure: args.sun_exposure,
        hormone_status: args.hormone_status,
    };
    Ok(submission.into_answers()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skin_assess::workflows::assessment::ValidationError;
    use std::io::Write;

    fn inline(age: &str) -> ScoreArgs {
        ScoreArgs {
            age: Some(age.to_string()),
            sleep_quality: Some("poor".to_string()),
            stress_level: Some("high".to_string()),
            period_status: Some("regular".to_string()),
            sun_exposure: Some("high".to_string()),
            ..ScoreArgs::default()
        }
    }

    #[test]
    fn inline_answers_are_scored() {
        let scored = score_answers(inline("42")).expect("scores");
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].assessed_skin_age, 56);
        assert_eq!(scored[0].primary_concern, "stress_management");
    }

    #[test]
    fn missing_inline_answer_is_a_validation_error() {
        let mut args = inline("42");
        args.period_status = None;
        match score_answers(args) {
            Err(AppError::Validation(ValidationError::MissingField(field))) => {
                assert_eq!(field, "periodStatus")
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn csv_rows_are_scored_in_order() {
        let path = std::env::temp_dir().join(format!(
            "skin-assess-score-{}.csv",
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).expect("create csv");
        writeln!(file, "age,sleepQuality,stressLevel,periodStatus").expect("write");
        writeln!(file, "30,excellent,low,regular").expect("write");
        writeln!(file, "50,poor,low,stopped").expect("write");
        drop(file);

        let scored = score_answers(ScoreArgs {
            csv: Some(path.clone()),
            ..ScoreArgs::default()
        })
        .expect("scores");
        std::fs::remove_file(&path).ok();

        let ages: Vec<i32> = scored.iter().map(|result| result.assessed_skin_age).collect();
        assert_eq!(ages, vec![30, 54]);
    }
}
