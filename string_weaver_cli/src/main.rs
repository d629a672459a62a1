use std::{
    fmt,
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Args, Parser, Subcommand, ValueEnum};
use string_weaver::{
    config::Shape,
    image::{prepare, Preparation},
    store::{self, PathState},
    verboser::{Message, Verboser},
    Algorithm, Config, Drawing, Float, Precision, Raster, State, Termination,
};
use thiserror::Error;

mod color;

use color::Color;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Computes a thread path for an image.
    Generate(GenerateArgs),
    /// Re-applies a saved path to its image and renders it again.
    Replay(ReplayArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Input file path.
    input: PathBuf,

    /// Number of nails surrounding the image.
    #[arg(short, long, default_value_t = 200)]
    nails: usize,

    /// Maximum number of threads.
    #[arg(short, long, default_value_t = 1500)]
    lines: usize,

    /// Darkness added by every thread, 1 to 255.
    #[arg(short, long, default_value_t = 35)]
    opacity: u8,

    /// Nearest neighbours on each side that may not be linked.
    #[arg(short, long, default_value_t = 15)]
    skip: usize,

    #[arg(long, default_value_t = ShapeArg::Circle)]
    shape: ShapeArg,

    /// Writes an intermediate svg every N threads.
    #[arg(short, long)]
    interval: Option<usize>,

    #[arg(long, default_value_t = 1)]
    save_slot: usize,

    /// Precision of calculations (Single/Double). Replays reuse the saved one.
    #[arg(short, long, default_value_t = PrecisionArg::Single)]
    precision: PrecisionArg,

    #[command(flatten)]
    preparation: PreparationArgs,

    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// Saved state file.
    save: PathBuf,

    /// Image the state was computed on.
    input: PathBuf,

    /// Replays only the first N threads.
    #[arg(short, long)]
    lines: Option<usize>,

    /// Overrides the saved thread darkness.
    #[arg(short, long)]
    opacity: Option<u8>,

    #[command(flatten)]
    preparation: PreparationArgs,

    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Args, Debug)]
struct PreparationArgs {
    /// Size in pixels of the longest side of the image.
    #[arg(short, long, default_value_t = 500)]
    resolution: u32,

    /// Contrast change in percent applied before computing.
    #[arg(long, default_value_t = 12.0)]
    contrast: f32,
}

impl PreparationArgs {
    fn preparation(&self) -> Preparation {
        Preparation {
            resolution: Some(self.resolution),
            contrast: self.contrast,
        }
    }
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Canvas colour of the rendered outputs.
    #[arg(long, default_value = "white")]
    background: Color,

    /// Thread colour of the rendered outputs.
    #[arg(long, default_value = "black")]
    color: Color,

    /// Stroke width of the svg threads.
    #[arg(long, default_value_t = 0.5)]
    thickness: f32,

    /// Nails per row in the instruction listing.
    #[arg(long, default_value_t = 20)]
    group: usize,
}

impl RenderArgs {
    fn svg<S: Float>(&self, drawing: &Drawing<'_, S>) -> svg::Document {
        drawing.build_svg(self.thickness, self.background.0, self.color.0)
    }
}

#[derive(Clone, Copy, Debug)]
enum ShapeArg {
    Circle,
    Rectangle,
}

impl ValueEnum for ShapeArg {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Circle, Self::Rectangle]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Circle => clap::builder::PossibleValue::new("circle")
                .alias("Circle")
                .alias("circular"),
            Self::Rectangle => clap::builder::PossibleValue::new("rectangle")
                .alias("Rectangle")
                .alias("rect"),
        })
    }
}

impl fmt::Display for ShapeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Shape::from(*self))
    }
}

impl From<ShapeArg> for Shape {
    fn from(value: ShapeArg) -> Self {
        match value {
            ShapeArg::Circle => Shape::Circle,
            ShapeArg::Rectangle => Shape::Rectangle,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum PrecisionArg {
    Single,
    Double,
}

impl ValueEnum for PrecisionArg {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Single, Self::Double]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Single => clap::builder::PossibleValue::new("Single")
                .alias("single")
                .alias("f32"),
            Self::Double => clap::builder::PossibleValue::new("Double")
                .alias("double")
                .alias("f64"),
        })
    }
}

impl fmt::Display for PrecisionArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "Single"),
            Self::Double => write!(f, "Double"),
        }
    }
}

/// Prints progress to stderr every time the completed percentage changes.
#[derive(Default)]
struct Progress {
    percent: Option<usize>,
}

impl Progress {
    fn report(&mut self, done: usize, total: usize) -> Option<usize> {
        let percent = done * 100 / total.max(1);
        if self.percent == Some(percent) {
            return None;
        }
        self.percent = Some(percent);
        Some(percent)
    }
}

impl Verboser for Progress {
    fn verbose(&mut self, message: Message) {
        match message {
            Message::CreatingNail(_) => {}
            Message::Baking => eprintln!("Baking distance table..."),
            Message::Computing(step, budget, from, to) => {
                if let Some(percent) = self.report(step, budget) {
                    eprintln!("{percent}% done: {from} -> {to}");
                }
            }
            Message::Replaying(edge, total) => {
                if let Some(percent) = self.report(edge, total) {
                    eprintln!("{percent}% replayed");
                }
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match &cli.command {
        Command::Generate(args) => match args.precision {
            PrecisionArg::Single => generate::<f32>(args),
            PrecisionArg::Double => generate::<f64>(args),
        },
        Command::Replay(args) => replay(args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn generate<S: Float>(args: &GenerateArgs) -> Result<(), CliError> {
    let shape = Shape::from(args.shape);
    let raster = load_raster(&args.input, shape, &args.preparation)?;
    let config = Config {
        nail_count: args.nails,
        max_lines: args.lines,
        opacity: args.opacity,
        skip_neighbors: args.skip,
        shape,
    };

    let mut progress = Progress::default();
    let mut algorithm = Algorithm::<S>::new(config, raster, &mut progress)?;
    let stem = file_stem(&args.input)?;
    let out_folder = sibling_folder(&args.input, "output")?;

    if let Some(step) = args.interval.filter(|step| *step > 0) {
        let mut iteration = 1;
        let mut current = step;
        while current < config.max_lines {
            if algorithm.compute(current, &mut progress) != State::Running {
                break;
            }
            let document = args.render.svg(&algorithm.drawing());
            svg::save(out_folder.join(format!("{stem}_{iteration}.svg")), &document)?;
            current += step;
            iteration += 1;
        }
    }
    algorithm.compute_all(&mut progress);

    let computation = algorithm.finish();
    match computation.termination() {
        Some(Termination::Degenerate) => eprintln!(
            "Stopped early after {} lines: no dark chord left.",
            computation.edges().len()
        ),
        _ => eprintln!("Drew {} lines.", computation.edges().len()),
    }
    write_outputs(&computation.drawing(), &out_folder, &stem, &args.render)?;

    let save_folder = sibling_folder(&args.input, "saves")?;
    let save_path = save_folder.join(format!("{stem}-save-{}.bin", args.save_slot));
    computation
        .capture(args.input.display().to_string())
        .save(&save_path)?;
    eprintln!("Saved state to {}", save_path.display());
    Ok(())
}

fn replay(args: &ReplayArgs) -> Result<(), CliError> {
    let state = PathState::load(&args.save)?;
    match state.precision {
        Precision::Single => replay_with::<f32>(args, &state),
        Precision::Double => replay_with::<f64>(args, &state),
    }
}

fn replay_with<S: Float>(args: &ReplayArgs, state: &PathState) -> Result<(), CliError> {
    let raster = load_raster(&args.input, state.shape, &args.preparation)?;
    let replay = state.replay::<S>(raster, args.lines, args.opacity, &mut Progress::default())?;
    eprintln!(
        "Replayed {} of {} lines of {}.",
        replay.edges().len(),
        state.edges.len(),
        state.image_name
    );

    let stem = file_stem(&args.input)?;
    let out_folder = sibling_folder(&args.input, "output")?;
    write_outputs(&replay.drawing(), &out_folder, &stem, &args.render)
}

fn load_raster(input: &Path, shape: Shape, args: &PreparationArgs) -> Result<Raster, CliError> {
    let image = image::open(input)?;
    Ok(prepare(&image, shape, args.preparation()))
}

fn write_outputs<S: Float>(
    drawing: &Drawing<'_, S>,
    out_folder: &Path,
    stem: &str,
    render: &RenderArgs,
) -> Result<(), CliError> {
    let png = out_folder.join(format!("{stem}-out.png"));
    drawing
        .build_rgb(render.background.0, render.color.0)
        .save(&png)?;

    let document = render.svg(drawing);
    svg::save(out_folder.join(format!("{stem}.svg")), &document)?;

    fs::write(
        out_folder.join(format!("{stem}.txt")),
        drawing.build_instructions(render.group),
    )?;
    eprintln!("Outputs written to {}", out_folder.display());
    Ok(())
}

fn file_stem(path: &Path) -> Result<String, CliError> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| CliError::InvalidFileName(path.to_path_buf()))
}

fn sibling_folder(path: &Path, name: &str) -> Result<PathBuf, CliError> {
    let folder = path.parent().unwrap_or(Path::new(".")).join(name);
    fs::create_dir_all(&folder)?;
    Ok(folder)
}

#[derive(Debug, Error)]
enum CliError {
    #[error("Invalid file name {0:?}")]
    InvalidFileName(PathBuf),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Weaver(#[from] string_weaver::Error),
    #[error(transparent)]
    Store(#[from] store::Error),
}
