use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};

use argh::FromArgs;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};

use particle_life::{Frame, FrameSink, PngSink, SimError, Simulation, SimulationParameters};

#[derive(FromArgs)]
/// Particle life on a wrap-around plane, rendered to numbered PNG frames.
struct Args {
    /// path to a JSON parameter file; the flags below override it
    #[argh(option)]
    config: Option<PathBuf>,

    /// number of particles
    #[argh(option)]
    particles: Option<usize>,

    /// number of particle types
    #[argh(option)]
    types: Option<usize>,

    /// time step
    #[argh(option)]
    dt: Option<f64>,

    /// interaction radius
    #[argh(option)]
    radius: Option<f64>,

    /// velocity multiplier applied each tick
    #[argh(option)]
    friction: Option<f64>,

    /// near-field threshold, strictly between 0 and 1
    #[argh(option)]
    beta: Option<f64>,

    /// world width
    #[argh(option)]
    width: Option<f64>,

    /// world height
    #[argh(option)]
    height: Option<f64>,

    /// random seed; drawn from the OS when omitted
    #[argh(option)]
    seed: Option<u64>,

    /// number of frames to render before stopping
    #[argh(option, default = "500")]
    frames: u64,

    /// directory the frames are written to
    #[argh(option, default = "PathBuf::from(\"./frames\")")]
    output: PathBuf,

    /// particle radius in pixels
    #[argh(option, default = "3")]
    draw_radius: i32,

    /// print the effective parameters as JSON and exit
    #[argh(switch)]
    dump_params: bool,
}

impl Args {
    fn parameters(&self) -> Result<SimulationParameters, SimError> {
        let mut params = match &self.config {
            Some(path) => SimulationParameters::from_json_file(path)?,
            None => SimulationParameters::default(),
        };
        if let Some(v) = self.particles {
            params.num_particles = v;
        }
        if let Some(v) = self.types {
            params.num_types = v;
        }
        if let Some(v) = self.dt {
            params.dt = v;
        }
        if let Some(v) = self.radius {
            params.r = v;
        }
        if let Some(v) = self.friction {
            params.friction_factor = v;
        }
        if let Some(v) = self.beta {
            params.beta = v;
        }
        if let Some(v) = self.width {
            params.width = v;
        }
        if let Some(v) = self.height {
            params.height = v;
        }
        if self.seed.is_some() {
            params.seed = self.seed;
        }
        Ok(params)
    }
}

/// Writes frames, advances the progress bar and raises the stop flag once
/// enough frames have been produced.
struct Driver<'a> {
    png: PngSink,
    pbar: ProgressBar,
    frames: u64,
    stop: &'a AtomicBool,
}

impl FrameSink for Driver<'_> {
    fn present(&mut self, frame: &Frame<'_>) -> Result<(), SimError> {
        self.png.present(frame)?;
        self.pbar.inc(1);
        if frame.tick >= self.frames {
            self.stop.store(true, Ordering::Relaxed);
        }
        Ok(())
    }

    fn close(&mut self) {
        self.png.close();
        self.pbar.finish();
    }
}

fn run(args: Args) -> Result<(), SimError> {
    let params = args.parameters()?;
    if args.dump_params {
        println!("{}", serde_json::to_string_pretty(&params)?);
        return Ok(());
    }

    let mut sim = Simulation::new(params)?;
    info!("seed {}", sim.seed());

    let frames = args.frames.max(1);
    let pbar = ProgressBar::new(frames);
    pbar.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}/{eta_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}",
        )
        .map_err(|e| SimError::Render(e.to_string()))?,
    );

    let stop = AtomicBool::new(false);
    let mut driver = Driver {
        png: PngSink::new(&args.output, args.draw_radius)?,
        pbar,
        frames,
        stop: &stop,
    };
    let ticks = sim.run(&stop, &mut driver)?;
    info!("rendered {} frames to {}", ticks, args.output.display());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args: Args = argh::from_env();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
