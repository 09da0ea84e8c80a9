mod cli_error;
mod script;

use clap::Args as ClapArgs;
use clap::Parser;
use clap::Subcommand;
use cli_error::CliError;
use itertools::Itertools;
use script::Step;
use serde_jsonlines::json_lines;
use serde_jsonlines::JsonLinesWriter;
use simple_log::log::info;
use simple_log::LogConfigBuilder;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use taggable_array::{
    to_tagged_buffer, Axis, DType, HostBuffer, HostQueue, Order, Tag, TagSet, Taggable,
    TaggedBuffer, TaggedBufferError,
};

/// Build a tagged host buffer and inspect how tags propagate through derived buffers.
#[derive(Parser, Debug)]
struct Args {
    /// Directory for the log file. Nothing is logged if no directory is provided.
    #[arg(long, default_value = None)]
    log_dir: Option<PathBuf>,

    /// One of off, error, warn, info, debug, trace.
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the metadata of a freshly tagged buffer as JSON.
    Describe {
        #[command(flatten)]
        buffer: BufferArgs,
    },

    /// Apply the steps of a JSON lines script one after the other and print the metadata after
    /// each step as one JSON line. Stops at the first step that fails.
    Replay {
        /// Path to the script. Every line is an object such as
        /// {"op":"tag_axis","axis":0,"tags":[{"name":"reduction"}]}.
        #[arg(short, long)]
        script: PathBuf,

        #[command(flatten)]
        buffer: BufferArgs,
    },
}

#[derive(ClapArgs, Debug)]
struct BufferArgs {
    /// Comma separated extent of every dimension, e.g. 4,3. Leave empty for a scalar.
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    shape: Vec<usize>,

    #[arg(long, default_value = "f64")]
    dtype: DType,

    /// Memory layout.
    #[arg(long, value_enum, ignore_case = true, default_value = "c")]
    order: OrderArg,

    /// Queue the buffer is created on.
    #[arg(long, default_value = None)]
    queue: Option<u32>,

    /// Whole-array tag as NAME or NAME=PAYLOAD. Can be given multiple times.
    #[arg(short, long)]
    tag: Vec<Tag>,

    /// Axis tag as INDEX:NAME or INDEX:NAME=PAYLOAD. Can be given multiple times.
    #[arg(short, long)]
    axis_tag: Vec<AxisTag>,
}

#[derive(Debug, Clone)]
struct AxisTag {
    axis: usize,
    tag: Tag,
}

impl FromStr for AxisTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (axis, tag) = s
            .split_once(':')
            .ok_or_else(|| format!("expected INDEX:TAG, got {s:?}"))?;
        let axis = axis
            .trim()
            .parse::<usize>()
            .map_err(|e| format!("invalid axis index {axis:?}: {e}"))?;
        let tag = tag.parse::<Tag>().map_err(|e| e.to_string())?;
        Ok(Self { axis, tag })
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OrderArg {
    /// Row major
    C,
    /// Column major
    F,
}

impl From<OrderArg> for Order {
    fn from(value: OrderArg) -> Self {
        match value {
            OrderArg::C => Order::C,
            OrderArg::F => Order::F,
        }
    }
}

impl BufferArgs {
    fn build(&self) -> Result<TaggedBuffer<HostBuffer>, CliError> {
        let mut builder =
            HostBuffer::builder(self.shape.clone(), self.dtype).order(self.order.into());
        if let Some(queue) = self.queue {
            builder = builder.queue(HostQueue(queue));
        }
        let buffer = builder.build()?;

        let axes = if self.axis_tag.is_empty() {
            None
        } else {
            let mut axes = vec![Axis::default(); self.shape.len()];
            for (axis, tags) in &self.axis_tag.iter().chunk_by(|axis_tag| axis_tag.axis) {
                let Some(entry) = axes.get_mut(axis) else {
                    return Err(TaggedBufferError::AxisOutOfRange {
                        axis,
                        ndim: self.shape.len(),
                    }
                    .into());
                };
                *entry = Axis::new(
                    entry
                        .tags()
                        .union(tags.map(|axis_tag| axis_tag.tag.clone())),
                );
            }
            Some(axes)
        };

        let tags: TagSet = self.tag.iter().cloned().collect();
        Ok(to_tagged_buffer(&buffer, axes, tags)?)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {e}");
        return ExitCode::from(e.exit_code());
    }

    ExitCode::SUCCESS
}

fn run(args: Args) -> Result<(), CliError> {
    if let Some(log_dir) = &args.log_dir {
        init_logging(log_dir, &args.log_level)?;
    }

    match args.command {
        Commands::Describe { buffer } => {
            let tagged = buffer.build()?;
            info!("describing buffer with shape {:?}", tagged.shape());
            let json = serde_json::to_string_pretty(&tagged.metadata())
                .map_err(|e| CliError::Output(e.into()))?;
            println!("{json}");
        }

        Commands::Replay { script, buffer } => {
            let steps = json_lines::<Step, _>(&script)
                .and_then(|lines| lines.collect::<std::io::Result<Vec<Step>>>())
                .map_err(|source| CliError::Script {
                    path: script.clone(),
                    source,
                })?;
            info!("replaying {} steps from {}", steps.len(), script.display());

            let mut tagged = buffer.build()?;
            let mut writer = JsonLinesWriter::new(std::io::stdout().lock());
            for (i, step) in steps.iter().enumerate() {
                tagged = step
                    .apply(&tagged)
                    .map_err(|source| CliError::Step { step: i, source })?;
                writer.write(&tagged.metadata())?;
            }
            writer.flush()?;
        }
    }

    Ok(())
}

fn init_logging(log_dir: &std::path::Path, level: &str) -> Result<(), CliError> {
    let log_path = log_dir.join("tagarray.log");

    let config = LogConfigBuilder::builder()
        .path(log_path.to_string_lossy())
        .size(100)
        .roll_count(10)
        .time_format("%Y-%m-%d %H:%M:%S")
        .level(level)
        .map_err(|e| CliError::Logging(e.to_string()))?
        .output_file()
        .build();

    simple_log::new(config).map_err(|e| CliError::Logging(e.to_string()))
}
