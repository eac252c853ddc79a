mod cli;

use chrono::Utc;
use clap::Parser;

use laneboard::board::lanes::TagFilter;
use laneboard::board::render::{BoardRender, CardDescriptor, Reconciler};
use laneboard::board::{FileStore, TaskStore};
use laneboard::config::{BoardConfig, default_config_path};
use laneboard::core::task::{NewTask, TaskId};
use laneboard::core::update::FieldUpdate;
use laneboard::transfer;

use cli::{Cli, Commands};

fn init_logging(debug: bool) {
    // Journal logging (`journalctl --user -t laneboard -f`), laneboard at
    // info/debug, everything else at warn.
    struct FilteredJournal {
        inner: systemd_journal_logger::JournalLog,
    }

    impl log::Log for FilteredJournal {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            if metadata.target().starts_with("laneboard") {
                let max = if laneboard::debug_logging() {
                    log::LevelFilter::Debug
                } else {
                    log::LevelFilter::Info
                };
                metadata.level() <= max
            } else {
                metadata.level() <= log::LevelFilter::Warn
            }
        }
        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                self.inner.log(record);
            }
        }
        fn flush(&self) {
            self.inner.flush();
        }
    }

    laneboard::set_debug_logging(debug);

    let journal = match systemd_journal_logger::JournalLog::new() {
        Ok(j) => j.with_syslog_identifier("laneboard".to_string()),
        // No journal (containers, non-systemd hosts): run without a logger.
        Err(_) => return,
    };
    if log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })).is_ok() {
        log::set_max_level(log::LevelFilter::Debug);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = BoardConfig::load(&default_config_path());
    if let Some(dir) = cli.data_dir {
        config.data_directory = dir;
    }
    init_logging(config.debug_logging);

    config.ensure_dirs()?;
    let kv = FileStore::open(&config.data_directory)?;
    let (mut store, report) = TaskStore::open(kv)?;
    if report.changed() {
        println!(
            "Upgraded stored data: {} migrated, {} resynced, {} id(s) repaired, {} unreadable entr(ies) dropped",
            report.migrated, report.resynced, report.repaired_ids, report.dropped
        );
    }

    match cli.command {
        Commands::Show { tags } => {
            let filter = TagFilter::with_tags(&tags);
            let mut reconciler = Reconciler::new();
            print_board(reconciler.rebuild(&store, &filter, Utc::now()));
        }
        Commands::Add {
            title,
            desc,
            priority,
            due,
        } => {
            let id = store.create(NewTask {
                title: title.join(" "),
                description: desc.unwrap_or_default(),
                date_due: due,
                priority,
                ..NewTask::default()
            })?;
            println!("Added {id}");
        }
        Commands::SetStatus { id, status } => {
            store.update_field(&TaskId::from(id), FieldUpdate::Status(status))?;
        }
        Commands::Delete { id } => store.soft_delete(&TaskId::from(id))?,
        Commands::Restore { id } => store.restore(&TaskId::from(id))?,
        Commands::Purge { id } => {
            let removed = store.hard_delete(&TaskId::from(id))?;
            println!("Removed '{}'", removed.title);
        }
        Commands::Move { id, lane, before } => {
            let before = before.map(TaskId::from);
            store.reorder(&TaskId::from(id), lane, before.as_ref())?;
        }
        Commands::RenameLane { lane, label } => store.rename_lane(lane, &label.join(" "))?,
        Commands::ResetLanes => store.reset_lane_labels(),
        Commands::ExportJson { file } => {
            let text = transfer::json::export_json(store.tasks(), store.settings(), Utc::now())?;
            std::fs::write(file, text)?;
        }
        Commands::ExportCsv { file } => {
            let text = transfer::csv::export_csv(store.tasks())?;
            std::fs::write(file, text)?;
        }
        Commands::Import { file } => {
            let text = std::fs::read_to_string(file)?;
            let payload = transfer::decode(&text)?;
            let report = transfer::apply(&mut store, payload);
            println!(
                "Imported {} task(s) ({} upgraded from older formats)",
                store.tasks().len(),
                report.migrated
            );
        }
    }

    if let Some(warning) = store.take_durability_warning() {
        eprintln!("warning: changes may not have been saved: {warning}");
    }
    Ok(())
}

fn print_board(render: &BoardRender) {
    for lane in &render.lanes {
        println!("== {} ({}) ==", lane.label, lane.lane);
        for card in &lane.cards {
            print_card(card);
        }
        println!();
    }
    if !render.trash.is_empty() {
        println!("== Trash ==");
        for card in &render.trash {
            print_card(card);
        }
        println!();
    }
    let tags: Vec<String> = render
        .tags
        .iter()
        .map(|t| {
            let mark = if t.active { "*" } else { "" };
            format!("#{}{mark}({})", t.tag, t.count)
        })
        .collect();
    if !tags.is_empty() {
        println!("tags: {}", tags.join(" "));
    }
    println!("{} of {} task(s) shown", render.visible(), render.total);
}

fn print_card(card: &CardDescriptor) {
    let due = card
        .date_due
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".into());
    let overdue = if card.overdue { " OVERDUE" } else { "" };
    let notes = if card.has_notes { " [notes]" } else { "" };
    println!(
        "  {} {:<12} due {}{}{}  {}",
        card.id, card.status, due, overdue, notes, card.title
    );
}
