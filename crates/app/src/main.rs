use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use shizu_core::{
    AppConfig, DjUpdate, EntryKind, Exporter, FfprobeProbe, LedgerHandle, LedgerRegistry, Lineup,
    PromoUpdate, Result,
};
use tracing_subscriber::EnvFilter;

mod cascade;
mod store;

use cascade::LedgerChange;
use store::DocumentStore;

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::from_path(path)?,
        None => AppConfig::default(),
    };
    let app = App::new(config, cli.ledger, cli.lineup);

    match cli.command {
        Commands::Init => app.init(),
        Commands::List => app.list(),
        Commands::Dj { command } => app.dj(command),
        Commands::Promo { command } => app.promo(command),
        Commands::Lineup { command } => app.lineup(command),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Manage the DJ ledger and event lineups", long_about = None)]
struct Cli {
    /// JSON configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Ledger document to operate on.
    #[arg(short, long, global = true, default_value = "ledger.json")]
    ledger: PathBuf,
    /// Lineup working document. Ledger renames and deletes are applied to it.
    #[arg(long, global = true, default_value = "lineup.json")]
    lineup: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write an empty ledger.
    Init,
    /// List every DJ and promo in the ledger.
    List,
    /// Edit DJs in the ledger.
    Dj {
        #[command(subcommand)]
        command: DjCommand,
    },
    /// Edit promos in the ledger.
    Promo {
        #[command(subcommand)]
        command: PromoCommand,
    },
    /// Build and export an event lineup.
    Lineup {
        #[command(subcommand)]
        command: LineupCommand,
    },
}

#[derive(Subcommand, Debug)]
enum DjCommand {
    /// Add a blank DJ under a generated name.
    Create,
    /// Change a DJ. Pass an empty string to clear a field.
    Edit {
        name: String,
        #[arg(long)]
        rename: Option<String>,
        #[arg(long)]
        logo: Option<String>,
        #[arg(long)]
        recording: Option<String>,
        #[arg(long)]
        rtmp: Option<String>,
        #[arg(long)]
        key: Option<String>,
    },
    Delete {
        name: String,
    },
}

#[derive(Subcommand, Debug)]
enum PromoCommand {
    /// Add a blank promo under a generated name.
    Create,
    /// Change a promo. Pass an empty string to clear the path.
    Edit {
        name: String,
        #[arg(long)]
        rename: Option<String>,
        #[arg(long)]
        path: Option<String>,
    },
    Delete {
        name: String,
    },
}

#[derive(Subcommand, Debug)]
enum LineupCommand {
    Show,
    AddDj {
        name: String,
        #[arg(long)]
        live: bool,
    },
    AddPromo {
        name: String,
    },
    RemoveDj {
        name: String,
    },
    RemovePromo {
        name: String,
    },
    /// Exchange two DJ positions (zero-based).
    SwapDjs {
        first: usize,
        second: usize,
    },
    /// Exchange two promo positions (zero-based).
    SwapPromos {
        first: usize,
        second: usize,
    },
    SetLive {
        name: String,
        #[arg(action = clap::ArgAction::Set)]
        live: bool,
    },
    /// Assign a VJ to a DJ slot. Omit the VJ to clear it.
    SetVj {
        name: String,
        vj: Option<String>,
    },
    /// Drop entries whose DJ or promo is no longer in the ledger.
    Prune,
    /// Write the export document for playout.
    Export {
        output: PathBuf,
    },
}

struct App {
    config: AppConfig,
    ledger_path: PathBuf,
    lineup_path: PathBuf,
    store: DocumentStore,
}

impl App {
    fn new(config: AppConfig, ledger_path: PathBuf, lineup_path: PathBuf) -> Self {
        let store = DocumentStore::new(config.backups.clone(), ".");
        Self {
            config,
            ledger_path,
            lineup_path,
            store,
        }
    }

    fn load_ledger(&self) -> Result<LedgerRegistry> {
        self.store
            .read_ledger(&self.ledger_path, self.config.rename_policy)
    }

    fn save_ledger(&self, ledger: &LedgerRegistry) -> Result<()> {
        self.store.write_ledger(&self.ledger_path, ledger)
    }

    fn init(&self) -> Result<()> {
        if self.ledger_path.exists() {
            return Err(format!("{} already exists", self.ledger_path.display()).into());
        }
        self.save_ledger(&LedgerRegistry::with_policy(self.config.rename_policy))
    }

    fn list(&self) -> Result<()> {
        let summary = self.load_ledger()?.summarize();
        println!("DJs:");
        for row in &summary.djs {
            println!(
                "  {:<24} logo: {:<5} rtmp: {:<10} recording: {}",
                row.name,
                row.has_logo,
                row.rtmp_server.as_deref().unwrap_or("-"),
                row.has_recording
            );
        }
        println!("Promos:");
        for row in &summary.promos {
            println!("  {:<24} recording: {}", row.name, row.has_recording);
        }
        Ok(())
    }

    fn dj(&self, command: DjCommand) -> Result<()> {
        let mut ledger = self.load_ledger()?;
        let change = match command {
            DjCommand::Create => {
                println!("{}", ledger.create_dj());
                None
            }
            DjCommand::Edit {
                name,
                rename,
                logo,
                recording,
                rtmp,
                key,
            } => {
                let current = ledger.get_dj(&name)?.clone();
                if let Some(server) = rtmp.as_deref().filter(|s| !s.is_empty()) {
                    if !self.config.stream.is_known_server(server) {
                        tracing::warn!(server, "RTMP server is not in the configured list");
                    }
                }
                let update = DjUpdate {
                    name: rename.unwrap_or_else(|| name.clone()),
                    logo_path: logo.or(current.logo_path),
                    recording_path: recording.or(current.recording_path),
                    rtmp_server: rtmp.or(current.rtmp_server),
                    stream_key: key.or(current.stream_key),
                };
                let new = update.name.clone();
                ledger.update_dj(&name, update)?;
                (new != name).then_some(LedgerChange::Renamed { old: name, new })
            }
            DjCommand::Delete { name } => {
                ledger.delete_dj(&name)?;
                Some(LedgerChange::Deleted(name))
            }
        };
        self.save_ledger(&ledger)?;
        self.follow_change(ledger, EntryKind::Dj, change)
    }

    fn promo(&self, command: PromoCommand) -> Result<()> {
        let mut ledger = self.load_ledger()?;
        let change = match command {
            PromoCommand::Create => {
                println!("{}", ledger.create_promo());
                None
            }
            PromoCommand::Edit { name, rename, path } => {
                let current = ledger.get_promo(&name)?.clone();
                let update = PromoUpdate {
                    name: rename.unwrap_or_else(|| name.clone()),
                    path: path.or(current.path),
                };
                let new = update.name.clone();
                ledger.update_promo(&name, update)?;
                (new != name).then_some(LedgerChange::Renamed { old: name, new })
            }
            PromoCommand::Delete { name } => {
                ledger.delete_promo(&name)?;
                Some(LedgerChange::Deleted(name))
            }
        };
        self.save_ledger(&ledger)?;
        self.follow_change(ledger, EntryKind::Promo, change)
    }

    /// Carries a rename or delete over to the lineup document, if there is one.
    fn follow_change(
        &self,
        ledger: LedgerRegistry,
        kind: EntryKind,
        change: Option<LedgerChange>,
    ) -> Result<()> {
        let Some(change) = change else {
            return Ok(());
        };
        if !self.lineup_path.exists() {
            return Ok(());
        }
        let mut lineup = self
            .store
            .read_lineup(&self.lineup_path, LedgerHandle::new(ledger))?;
        if cascade::apply(&mut lineup, kind, &change)? {
            self.store.write_lineup(&self.lineup_path, &lineup)?;
        }
        Ok(())
    }

    fn lineup(&self, command: LineupCommand) -> Result<()> {
        let handle = LedgerHandle::new(self.load_ledger()?);
        let mut lineup = self.store.read_lineup(&self.lineup_path, handle)?;

        match command {
            LineupCommand::Show => {
                let summary = lineup.summarize();
                println!("DJs:");
                for (index, entry) in summary.djs.iter().enumerate() {
                    let mode = if entry.is_live { "live" } else { "recorded" };
                    match entry.vj.as_deref() {
                        Some(vj) => println!("  {index:>2} {:<24} {mode:<8} vj: {vj}", entry.name),
                        None => println!("  {index:>2} {:<24} {mode}", entry.name),
                    }
                }
                println!("Promos:");
                for (index, name) in summary.promos.iter().enumerate() {
                    println!("  {index:>2} {name}");
                }
                for (kind, name) in lineup.stale_entries()? {
                    tracing::warn!(%kind, %name, "lineup entry is missing from the ledger");
                }
                return Ok(());
            }
            LineupCommand::AddDj { name, live } => lineup.add_dj(&name, live)?,
            LineupCommand::AddPromo { name } => lineup.add_promo(&name)?,
            LineupCommand::RemoveDj { name } => {
                lineup.remove_dj(&name)?;
            }
            LineupCommand::RemovePromo { name } => {
                lineup.remove_promo(&name)?;
            }
            LineupCommand::SwapDjs { first, second } => lineup.swap_djs(first, second)?,
            LineupCommand::SwapPromos { first, second } => lineup.swap_promos(first, second)?,
            LineupCommand::SetLive { name, live } => lineup.update_dj(&name, live)?,
            LineupCommand::SetVj { name, vj } => lineup.set_vj(&name, vj)?,
            LineupCommand::Prune => {
                for (kind, name) in lineup.prune_stale()? {
                    println!("dropped {kind} {name}");
                }
            }
            LineupCommand::Export { output } => return self.export(&lineup, &output),
        }

        self.store.write_lineup(&self.lineup_path, &lineup)
    }

    fn export(&self, lineup: &Lineup, output: &Path) -> Result<()> {
        let probe = FfprobeProbe::new(&self.config.probe);
        let exporter = Exporter::new(&self.config.stream, &probe);
        let export = lineup.export(&exporter)?;
        self.store.write_export(output, &export)
    }
}
