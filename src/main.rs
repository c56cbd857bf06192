use clap::Parser;
use log::{error, info, LevelFilter};
use std::{net::SocketAddr, path::PathBuf, process};
use vugen_replay::{
    MimeTable, RecordingSource, ReplayConfiguration, ScriptDirectory, VuGenFolder,
};

/// Serves a recorded VuGen script back to the browser that recorded it.
#[derive(Parser, Debug)]
#[command(name = "vugen-local-replay", version)]
struct Cli {
    /// Folder holding exactly one copied VuGen script
    #[arg(long, default_value = "vugen")]
    vugen_dir: PathBuf,

    /// Replay this script folder instead of discovering one in --vugen-dir
    #[arg(long)]
    script: Option<PathBuf>,

    /// Address to listen on; repeat for every port the recording uses
    #[arg(long = "listen", default_value = "127.0.0.1:80")]
    listen: Vec<SocketAddr>,

    /// Scheme of the recorded URLs when the request carries no X-Forwarded-Proto
    #[arg(long, default_value = "http")]
    scheme: String,

    /// mime.types file used when a payload has no recorded Content-Type
    #[arg(long)]
    mime_types: Option<PathBuf>,

    /// Do not check the hosts file and listening ports before replaying
    #[arg(long, default_value_t = false)]
    skip_preflight: bool,
}

#[tokio::main]
async fn main() {
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Info)
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();

    let cli = Cli::parse();

    let recording_source: Box<dyn RecordingSource + Send + Sync> = match cli.script {
        Some(script) => {
            info!("replaying script {}", script.display());
            Box::new(ScriptDirectory::new(script))
        }
        None => {
            info!("replaying the script copied to {}", cli.vugen_dir.display());
            Box::new(VuGenFolder::new(cli.vugen_dir))
        }
    };

    let mut configuration = ReplayConfiguration::new(recording_source);
    configuration.set_scheme(cli.scheme);

    for address in cli.listen {
        configuration.add_listen_address(address);
    }

    if let Some(path) = cli.mime_types {
        match MimeTable::load(&path) {
            Ok(table) => {
                info!("loaded {} mime types from {}", table.len(), path.display());
                configuration.set_mime_table(table);
            }
            Err(e) => {
                error!("could not load {}: {}", path.display(), e);
                process::exit(1);
            }
        }
    }

    if !cli.skip_preflight {
        configuration.add_default_preflight_checks();
    }

    if let Err(e) = vugen_replay::serve(configuration).await {
        error!("{}", e);
        process::exit(1);
    }
}
