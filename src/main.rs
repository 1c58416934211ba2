use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::Parser;

use zmark::kernel::{Effect, Store};
use zmark::models::parse_html;
use zmark::services::settings::{
    ensure_settings_file, load_settings, load_settings_from, Settings,
};

mod logging;

/// 在 HTML 文档的可见文本中查找并高亮匹配项。
/// 每行从 stdin 读取一个 JSON 请求，向 stdout 写回一个 JSON 响应。
#[derive(Parser, Debug)]
#[command(name = "zmark", version, about = "Highlight text matches inside an HTML document")]
struct Cli {
    /// Document to load
    #[arg(value_name = "DOCUMENT")]
    document: PathBuf,

    /// Settings file to use instead of the one in the cache directory
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write the final markup here once stdin closes
    #[arg(long, short = 'o', value_name = "PATH")]
    output: Option<PathBuf>,

    /// Disable the log file
    #[arg(long)]
    no_log: bool,

    /// Mirror log output to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let _logging = if cli.no_log {
        None
    } else {
        logging::init(cli.verbose)
    };

    let settings = resolve_settings(cli.config.as_deref())?;
    let source = std::fs::read_to_string(&cli.document)?;
    let tree =
        parse_html(&source).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    tracing::info!(
        document = %cli.document.display(),
        nodes = tree.len(),
        "document loaded"
    );

    let mut store = Store::new(tree, settings.highlight);
    serve(&mut store, io::stdin().lock(), io::stdout().lock())?;

    if let Some(path) = cli.output {
        let tree = store.into_tree();
        std::fs::write(&path, tree.outer_markup(tree.root()))?;
        tracing::info!(output = %path.display(), "markup written");
    }
    Ok(())
}

fn resolve_settings(explicit: Option<&Path>) -> io::Result<Settings> {
    if let Some(path) = explicit {
        return load_settings_from(path);
    }
    if let Err(e) = ensure_settings_file() {
        tracing::warn!(error = %e, "settings file unavailable, using defaults");
    }
    Ok(load_settings().unwrap_or_default())
}

fn serve(store: &mut Store, input: impl BufRead, output: impl Write) -> io::Result<()> {
    let mut writer = BufWriter::new(output);
    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let result = store.dispatch_json(line);
        for effect in &result.effects {
            match effect {
                Effect::ScrollIntoView { node, block } => {
                    tracing::info!(?node, ?block, "scroll into view")
                }
                Effect::HighlightAdded(entry) => {
                    tracing::info!(id = entry.id, text = %entry.text, count = entry.count, "highlight added")
                }
            }
        }

        writeln!(writer, "{}", result.response.to_json())?;
        writer.flush()?;
    }
    Ok(())
}
