use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use reportgrid::backend::render_chart_png;
use reportgrid::compose::compose_source;
use reportgrid::record::{DocumentSource, RecordSet};
use reportgrid::table::RankingPolicy;
use reportgrid::template::Template;

#[derive(Parser, Debug)]
#[command(name = "reportgrid")]
#[command(about = "Compose table and chart scenes from a JSON template and record data", long_about = None)]
struct Args {
    /// Path to the report template JSON
    template: PathBuf,

    /// Read records from stdin as CSV instead of JSON
    #[arg(long)]
    csv: bool,

    /// Model attribute holding the record list when stdin is a JSON object
    #[arg(long, default_value = "records")]
    data_field: String,

    /// Directory to render chart PNGs into
    #[arg(long)]
    render_charts: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let template_text = fs::read_to_string(&args.template)
        .with_context(|| format!("Failed to read template '{}'", args.template.display()))?;
    let template = Template::from_json(&template_text)?;

    // Read record data from stdin
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read record data from stdin")?;

    let source = if args.csv {
        DocumentSource {
            model: None,
            records: RecordSet::from_csv(&input)?,
        }
    } else {
        let value: serde_json::Value =
            serde_json::from_str(&input).context("Record data is not valid JSON")?;
        DocumentSource::from_json(&value, &args.data_field)?
    };

    // Ranking policies are caller-supplied closures; the CLI has none.
    let scene = compose_source(&template, &source, &RankingPolicy::new())
        .map_err(|errors| anyhow!("Template validation failed:\n  {}", errors.join("\n  ")))?;

    if let Some(dir) = &args.render_charts {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create '{}'", dir.display()))?;
        for (index, chart) in scene.charts.iter().enumerate() {
            let png = render_chart_png(chart)
                .with_context(|| format!("Failed to render chart {}", index))?;
            let path = dir.join(format!("chart-{:02}.png", index));
            fs::write(&path, png)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
        }
    }

    // Write the composed scene to stdout
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, &scene).context("Failed to write scene JSON")?;
    handle.write_all(b"\n").context("Failed to write scene JSON")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}
