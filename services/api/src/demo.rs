use crate::infra::InMemoryBlobStore;
use clap::Args;
use qualform::error::AppError;
use qualform::form::domain::{LevelCatalog, RecordDraft, Tier};
use qualform::form::{FormServiceError, QualificationFormService};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Extenuating-circumstances note to record (defaults to a sample note)
    #[arg(long)]
    pub(crate) note: Option<String>,
    /// Skip the progress breakdown listing
    #[arg(long)]
    pub(crate) skip_breakdown: bool,
}

fn draft(subject: &str, level: &str, grade: &str, year: &str) -> RecordDraft {
    RecordDraft {
        subject: subject.to_string(),
        level: level.to_string(),
        grade: grade.to_string(),
        year: year.to_string(),
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let store = Arc::new(InMemoryBlobStore::default());
    let service = QualificationFormService::open(store, LevelCatalog::standard())?;

    println!("== Qualifications form demo ==");

    let entries = [
        (Tier::Gcse, draft("Mathematics", "GCSE", "9", "2023")),
        (Tier::Gcse, draft("English Language", "GCSE", "8", "2023")),
        (
            Tier::LevelThree,
            draft("Computer Science", "A Level", "A*", "2025"),
        ),
    ];
    for (tier, entry) in entries {
        match service.add_record(tier, &entry) {
            Ok(record) => println!(
                "added [{}] {} ({}, grade {})",
                tier.slug(),
                record.subject,
                record.level,
                record.grade
            ),
            Err(error) => println!("rejected draft: {error}"),
        }
    }

    // One deliberately bad draft to show the per-record validator at work.
    let rejected = service.add_record(Tier::Gcse, &draft("History", "GCSE", "6", "24"));
    if let Err(error) = rejected {
        println!("rejected draft: {error}");
    }

    let note = args.note.unwrap_or_else(|| {
        "I was recovering from surgery during my summer exam window.".to_string()
    });
    service.set_note(note);

    println!("progress: {}%", service.progress());
    if !args.skip_breakdown {
        for component in service.progress_breakdown().components {
            let mark = if component.satisfied { "x" } else { " " };
            println!("  [{mark}] {} (+{})", component.rule.label(), component.points);
        }
    }

    match service.submit() {
        Ok(payload) => {
            println!("submission payload:");
            match serde_json::to_string_pretty(&payload) {
                Ok(rendered) => println!("{rendered}"),
                Err(error) => println!("(payload failed to render: {error})"),
            }
        }
        Err(FormServiceError::SubmissionBlocked { problems }) => {
            println!("submission blocked:");
            for problem in problems {
                println!("  - {problem}");
            }
        }
        Err(other) => println!("submission failed: {other}"),
    }

    Ok(())
}
