use crate::infra::InMemoryCandidateGateway;
use clap::Args;
use hireflow::config::PipelineConfig;
use hireflow::error::AppError;
use hireflow::pipeline::{
    BoardIntent, BoardView, CandidateGateway, CandidateId, FilterCriteria, KanbanBoard,
    ListView, MoveOutcome, PipelineEngine, SortKey, StageId, StageRegistry, UndoOutcome,
    ViewMode,
};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Job whose board is loaded from the seeded backend.
    #[arg(long, default_value = "job-001")]
    pub(crate) job_id: String,
    /// Candidate ids whose stage changes the backend rejects.
    #[arg(long = "fail-candidate", default_value = "cand-04")]
    pub(crate) fail_candidates: Vec<String>,
    /// Print the final board snapshot as JSON.
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        job_id,
        fail_candidates,
        json,
    } = args;

    let config = PipelineConfig::new(job_id);
    let gateway = Arc::new(
        InMemoryCandidateGateway::seeded(&config.job_id).rejecting(fail_candidates.clone()),
    );
    let engine = PipelineEngine::load(gateway, StageRegistry::standard(), &config).await?;

    println!("Applicant pipeline demo ({})", engine.job_id());
    render(&engine, ViewMode::List);
    render(&engine, ViewMode::Kanban);

    println!("\nKeyboard drag");
    let mover = CandidateId::from("cand-01");
    let intents = [
        BoardIntent::PickUp {
            candidate_id: mover.clone(),
        },
        BoardIntent::HoverOver {
            candidate_id: mover.clone(),
            stage: StageId::from("reviewing"),
        },
        BoardIntent::Drop {
            candidate_id: mover.clone(),
            stage: StageId::from("reviewing"),
        },
    ];
    for intent in intents {
        engine.dispatch(intent).await?;
        println!("  live region: {}", engine.announcement());
    }

    if let Some(rejected) = fail_candidates.first() {
        println!("\nRejected move");
        let candidate = CandidateId::from(rejected.as_str());
        match engine
            .move_candidate(&candidate, &StageId::from("offered"))
            .await
        {
            Ok(MoveOutcome::Failed(notice)) => {
                println!("  notice #{}: {}", notice.id, notice.message);
                println!("  live region: {}", engine.announcement());
            }
            Ok(outcome) => println!("  backend accepted the move: {outcome:?}"),
            Err(err) => println!("  move skipped: {err}"),
        }
    }

    println!("\nFilter: tag `rust`, oldest applications first");
    engine.set_filter(FilterCriteria {
        tags: ["rust".to_string()].into_iter().collect(),
        ..FilterCriteria::default()
    });
    engine.set_sort(SortKey::DateAsc);
    render(&engine, ViewMode::List);
    engine.set_filter(FilterCriteria::default());
    engine.set_sort(SortKey::default());

    println!("\nUndo / redo");
    print_history_step("undo", engine.undo().await?);
    println!("  live region: {}", engine.announcement());
    print_history_step("redo", engine.redo().await?);
    println!("  live region: {}", engine.announcement());
    println!(
        "  history: {} undoable, {} redoable",
        engine.undo_depth(),
        engine.redo_depth()
    );

    render(&engine, ViewMode::Kanban);

    if json {
        match serde_json::to_string_pretty(&engine.snapshot()) {
            Ok(payload) => println!("\nSnapshot payload:\n{payload}"),
            Err(err) => println!("\nSnapshot payload unavailable: {err}"),
        }
    }

    Ok(())
}

fn print_history_step(label: &str, outcome: UndoOutcome) {
    match outcome {
        UndoOutcome::Empty => println!("- {label}: nothing to {label}"),
        UndoOutcome::Applied(transition) => println!(
            "- {label}: {} {} -> {}",
            transition.candidate_id, transition.from_stage, transition.to_stage
        ),
        UndoOutcome::Failed(notice) => println!("- {label} failed: {}", notice.message),
        UndoOutcome::Superseded => println!("- {label}: superseded by a newer move"),
    }
}

fn render<G>(engine: &PipelineEngine<G>, mode: ViewMode)
where
    G: CandidateGateway + 'static,
{
    let snapshot = engine.snapshot();
    match snapshot.view(engine.registry(), mode) {
        BoardView::List(list) => render_list(&list, snapshot.criteria.active_count()),
        BoardView::Kanban(board) => render_kanban(&board),
    }
}

fn render_list(list: &ListView<'_>, active_filters: usize) {
    println!(
        "\nList view ({} candidates, {} filters applied)",
        list.rows.len(),
        active_filters
    );
    for candidate in &list.rows {
        let fit = candidate
            .fit_index
            .map(|fit| fit.to_string())
            .unwrap_or_else(|| "--".to_string());
        let assignee = candidate
            .assignee
            .as_ref()
            .map(|member| member.0.as_str())
            .unwrap_or("unassigned");
        println!(
            "- {:<16} {:<13} fit {:>3}  applied {}  {}",
            candidate.candidate_name,
            candidate.stage().as_str(),
            fit,
            candidate.applied_at.date_naive(),
            assignee
        );
    }
}

fn render_kanban(board: &KanbanBoard<'_>) {
    println!("\nKanban view");
    for column in &board.columns {
        let names: Vec<&str> = column
            .cards
            .iter()
            .map(|card| card.candidate_name.as_str())
            .collect();
        let marker = if column.terminal { " (closed)" } else { "" };
        println!(
            "- {}{} [{}]: {}",
            column.label,
            marker,
            column.count,
            if names.is_empty() {
                "-".to_string()
            } else {
                names.join(", ")
            }
        );
    }
}
