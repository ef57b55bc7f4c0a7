use clap::{value_parser, Arg, Command};
use colored::*;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Instant;

use imadjust::config::Config;
use imadjust::{is_image_file, AdjustmentParams, Editor, EngineHandle, NativeEngine, SourceImage};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let matches = Command::new("imadjust")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Adjust brightness, contrast and saturation of a photo")
        .arg(
            Arg::new("input")
                .value_name("INPUT")
                .help("Image file to adjust")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Where to write the PNG result (default: adjusted-image.png)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("brightness")
                .short('b')
                .long("brightness")
                .value_name("VALUE")
                .help("Brightness (0 to 200, 100 = unchanged)")
                .default_value("100")
                .value_parser(value_parser!(i64)),
        )
        .arg(
            Arg::new("contrast")
                .short('c')
                .long("contrast")
                .value_name("VALUE")
                .help("Contrast (0 to 200, 100 = unchanged)")
                .default_value("100")
                .value_parser(value_parser!(i64)),
        )
        .arg(
            Arg::new("saturation")
                .short('s')
                .long("saturation")
                .value_name("VALUE")
                .help("Saturation (0 to 200, 100 = unchanged)")
                .default_value("100")
                .value_parser(value_parser!(i64)),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .value_name("NUM")
                .help("Number of threads to use for processing (default: from config, 0 = auto-detect)")
                .value_parser(value_parser!(usize)),
        )
        .get_matches();

    let mut config = Config::load();

    let input = matches
        .get_one::<PathBuf>("input")
        .ok_or("Missing input file")?;
    let output = matches
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(&config.editor.export_file_name));
    if let Some(&threads) = matches.get_one::<usize>("threads") {
        config.engine.threads = threads;
    }

    let params = AdjustmentParams::new(
        parse_param(&matches, "brightness", "Brightness")?,
        parse_param(&matches, "contrast", "Contrast")?,
        parse_param(&matches, "saturation", "Saturation")?,
    );

    if !is_image_file(input) {
        return Err(format!("{}: {}", "Not a supported image file".red(), input.display()).into());
    }

    println!("{}", "Processing image with settings:".bold().cyan());
    println!("  {}: {}", "Brightness".green(), params.brightness());
    println!("  {}: {}", "Contrast".green(), params.contrast());
    println!("  {}: {}", "Saturation".green(), params.saturation());
    if config.engine.threads > 0 {
        println!("  {}: {} (manual)", "Threads".green(), config.engine.threads);
    } else {
        println!("  {}: auto-detect", "Threads".green());
    }

    let start_time = Instant::now();
    process_image(input, &output, params, &config)?;

    println!("{}: {}", "Image written".bold().green(), output.display());
    println!("{}: {:.2?}", "Processing time".blue(), start_time.elapsed());
    Ok(())
}

fn parse_param(
    matches: &clap::ArgMatches,
    id: &str,
    name: &'static str,
) -> Result<u8, Box<dyn Error>> {
    let value = matches.get_one::<i64>(id).copied().unwrap_or(100);
    Ok(AdjustmentParams::validate(name, value)?)
}

fn process_image(
    input: &Path,
    output: &Path,
    params: AdjustmentParams,
    config: &Config,
) -> Result<(), Box<dyn Error>> {
    let engine = NativeEngine::load(&config.engine)?;
    let mut editor = Editor::new(EngineHandle::ready(engine), config.editor.clone());

    let source = SourceImage::open(input)?;
    println!(
        "{} {} ({}x{})",
        "Loaded".bold().blue(),
        input.display(),
        source.width(),
        source.height()
    );

    // Sliders first so loading renders exactly once
    editor.set_params(params)?;
    editor.load_image(source)?;

    if !editor.save_png(output)? {
        return Err(format!("{}", "Nothing was rendered".red()).into());
    }
    Ok(())
}
