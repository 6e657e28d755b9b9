//! dicom-codec CLI - encode/decode/inspect DICOM pixel data via the codec
//! registry, addressed by Transfer Syntax UID.

use clap::{Parser, Subcommand};
use dicom_pixel_codecs::registry::{global_registry, CodecOptions, ProgressionOrder};
use dicom_pixel_codecs::FrameInfo;
use std::fs;
use std::path::PathBuf;

/// Encode, decode, and inspect DICOM pixel data using the registered codecs.
#[derive(Parser)]
#[command(name = "dicom-codec")]
#[command(version)]
#[command(about = "DICOM pixel codec command-line utility", long_about = None)]
#[command(after_help = "EXAMPLES:
    dicom-codec decode -i frame.j2k -o pixels.raw
    dicom-codec encode -i pixels.raw -o frame.jls -u 1.2.840.10008.1.2.4.80 -w 512 -H 512
    dicom-codec info -i frame.jpg
    dicom-codec list")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a compressed frame to raw interleaved pixel data.
    #[command(visible_alias = "d")]
    Decode {
        #[arg(short, long, help = "Path to the compressed input file")]
        input: PathBuf,
        #[arg(short, long, help = "Path for the decoded raw pixel output")]
        output: PathBuf,
    },

    /// Encode raw interleaved pixel data using a named Transfer Syntax UID.
    #[command(visible_alias = "e")]
    Encode {
        #[arg(short, long, help = "Path to raw pixel data file")]
        input: PathBuf,
        #[arg(short, long, help = "Path for the encoded output file")]
        output: PathBuf,
        #[arg(short = 'u', long, help = "DICOM Transfer Syntax UID or codec name")]
        uid: String,
        #[arg(short, long, help = "Image width in pixels")]
        width: u32,
        #[arg(short = 'H', long, help = "Image height in pixels")]
        height: u32,
        #[arg(short = 'b', long, default_value = "8", help = "Bits per sample")]
        bits: i32,
        #[arg(short = 'n', long, default_value = "1", help = "1 = grayscale, 3 = RGB")]
        components: i32,
        #[arg(short, long, default_value = "85", help = "Quality 1-100 (lossy codecs)")]
        quality: u8,
        #[arg(long, default_value = "0", help = "Lossless predictor 0-7 (0 = auto)")]
        predictor: u8,
        #[arg(long, default_value = "0", help = "JPEG-LS near-lossless bound (0 = lossless)")]
        near_lossless: i32,
        #[arg(long, default_value = "5", help = "JPEG 2000 decomposition levels")]
        levels: u8,
    },

    /// Decode then re-encode under a different Transfer Syntax UID.
    #[command(visible_alias = "t")]
    Transcode {
        #[arg(short, long, help = "Path to the input image file")]
        input: PathBuf,
        #[arg(short, long, help = "Path for the transcoded output file")]
        output: PathBuf,
        #[arg(short = 'u', long, help = "Target DICOM Transfer Syntax UID or codec name")]
        uid: String,
        #[arg(short, long, default_value = "85", help = "Quality 1-100 (lossy codecs)")]
        quality: u8,
    },

    /// Print frame dimensions and sample format for a compressed file.
    #[command(visible_alias = "i")]
    Info {
        #[arg(short, long, help = "Path to the compressed input file")]
        input: PathBuf,
    },

    /// List every registered Transfer Syntax UID and codec name.
    #[command(visible_alias = "l")]
    List,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Decode { input, output } => decode_file(&input, &output),
        Commands::Encode {
            input,
            output,
            uid,
            width,
            height,
            bits,
            components,
            quality,
            predictor,
            near_lossless,
            levels,
        } => encode_file(
            &input,
            &output,
            &uid,
            FrameInfo {
                width,
                height,
                bits_per_sample: bits,
                component_count: components,
            },
            quality,
            predictor,
            near_lossless,
            levels,
        ),
        Commands::Transcode {
            input,
            output,
            uid,
            quality,
        } => transcode_file(&input, &output, &uid, quality),
        Commands::Info { input } => show_info(&input),
        Commands::List => {
            list_codecs();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Transfer syntax families whose decode path auto-detects the specific
/// sub-variant (baseline vs. extended, any-predictor vs. SV1, lossless vs.
/// near-lossless, reversible vs. irreversible) from the bitstream itself, so
/// any one UID in the family is enough to reach the shared decoder.
const JPEG1_PROBE_UID: &str = "1.2.840.10008.1.2.4.50";
const JPEGLS_PROBE_UID: &str = "1.2.840.10008.1.2.4.80";
const J2K_PROBE_UID: &str = "1.2.840.10008.1.2.4.90";

fn probe_uid_for(data: &[u8]) -> Result<&'static str, Box<dyn std::error::Error>> {
    if data.starts_with(&[0xFF, 0xD8]) {
        Ok(JPEG1_PROBE_UID)
    } else if data.starts_with(&[0xFF, 0x4F]) || data.starts_with(b"\x00\x00\x00\x0CjP") {
        Ok(J2K_PROBE_UID)
    } else {
        Ok(JPEGLS_PROBE_UID)
    }
}

fn decode_file(input: &PathBuf, output: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    let probe_uid = probe_uid_for(&data)?;
    let codec = global_registry()
        .get(probe_uid)
        .ok_or("no codec registered for the detected format")?;
    let decoded = codec.decode(&data)?;
    fs::write(output, &decoded.pixels)?;
    println!(
        "Decoded {}x{} image ({} components, {}-bit) to {:?}",
        decoded.frame_info.width,
        decoded.frame_info.height,
        decoded.frame_info.component_count,
        decoded.frame_info.bits_per_sample,
        output
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn encode_file(
    input: &PathBuf,
    output: &PathBuf,
    uid: &str,
    frame_info: FrameInfo,
    quality: u8,
    predictor: u8,
    near_lossless: i32,
    levels: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let pixels = fs::read(input)?;
    let codec = global_registry()
        .get(uid)
        .ok_or_else(|| format!("no codec registered for {uid:?}"))?;
    let options = options_for(codec.uid(), quality, frame_info.bits_per_sample, predictor, near_lossless, levels);
    let encoded = codec.encode(&pixels, &frame_info, options.as_ref())?;
    fs::write(output, &encoded)?;
    println!(
        "Encoded {}x{} image to {:?} using {}",
        frame_info.width,
        frame_info.height,
        output,
        codec.name()
    );
    Ok(())
}

fn transcode_file(
    input: &PathBuf,
    output: &PathBuf,
    uid: &str,
    quality: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    let probe_uid = probe_uid_for(&data)?;
    let source_codec = global_registry()
        .get(probe_uid)
        .ok_or("no codec registered for the detected format")?;
    let decoded = source_codec.decode(&data)?;

    let target_codec = global_registry()
        .get(uid)
        .ok_or_else(|| format!("no codec registered for {uid:?}"))?;
    let options = options_for(
        target_codec.uid(),
        quality,
        decoded.frame_info.bits_per_sample,
        0,
        0,
        5,
    );
    let encoded = target_codec.encode(&decoded.pixels, &decoded.frame_info, options.as_ref())?;
    fs::write(output, &encoded)?;
    println!(
        "Transcoded {}x{} image to {:?} using {}",
        decoded.frame_info.width,
        decoded.frame_info.height,
        output,
        target_codec.name()
    );
    Ok(())
}

fn options_for(
    uid: &str,
    quality: u8,
    bit_depth: i32,
    predictor: u8,
    near_lossless: i32,
    levels: u8,
) -> Option<CodecOptions> {
    match uid {
        "1.2.840.10008.1.2.4.50" => Some(CodecOptions::JpegBaseline { quality }),
        "1.2.840.10008.1.2.4.51" => Some(CodecOptions::JpegExtended {
            quality,
            bit_depth: bit_depth as u8,
        }),
        "1.2.840.10008.1.2.4.57" | "1.2.840.10008.1.2.4.70" => {
            Some(CodecOptions::JpegLossless { predictor })
        }
        "1.2.840.10008.1.2.4.80" | "1.2.840.10008.1.2.4.81" => {
            Some(CodecOptions::JpegLs { near_lossless })
        }
        "1.2.840.10008.1.2.4.90" => Some(CodecOptions::J2kLossless {
            num_levels: levels,
            allow_mct: true,
            num_layers: 1,
            progression_order: ProgressionOrder::Lrcp,
            target_ratio: 0.0,
            use_pcrd_opt: false,
            append_lossless_layer: false,
        }),
        "1.2.840.10008.1.2.4.91" => Some(CodecOptions::J2kLossy {
            quality,
            num_levels: levels,
            allow_mct: true,
            num_layers: 1,
            progression_order: ProgressionOrder::Lrcp,
            target_ratio: 0.0,
        }),
        _ => None,
    }
}

fn show_info(input: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    let probe_uid = probe_uid_for(&data)?;
    let codec = global_registry()
        .get(probe_uid)
        .ok_or("no codec registered for the detected format")?;
    let decoded = codec.decode(&data)?;

    println!("File: {input:?}");
    println!("Size: {} bytes", data.len());
    println!("Detected family: {}", codec.name());
    println!("Dimensions: {}x{}", decoded.frame_info.width, decoded.frame_info.height);
    println!("Bit depth:  {} bits", decoded.frame_info.bits_per_sample);
    println!("Components: {}", decoded.frame_info.component_count);
    Ok(())
}

fn list_codecs() {
    let registry = global_registry();
    println!("Registered Transfer Syntax UIDs:");
    for (uid, name) in [
        ("1.2.840.10008.1.2.4.50", "JPEG Baseline"),
        ("1.2.840.10008.1.2.4.51", "JPEG Extended"),
        ("1.2.840.10008.1.2.4.57", "JPEG Lossless"),
        ("1.2.840.10008.1.2.4.70", "JPEG Lossless SV1"),
        ("1.2.840.10008.1.2.4.80", "JPEG-LS Lossless"),
        ("1.2.840.10008.1.2.4.81", "JPEG-LS Near-Lossless"),
        ("1.2.840.10008.1.2.4.90", "JPEG 2000 Lossless"),
        ("1.2.840.10008.1.2.4.91", "JPEG 2000 Lossy"),
    ] {
        let status = if registry.get(uid).is_some() { "ok" } else { "missing" };
        println!("  {uid}  {name:<24} [{status}]");
    }
}
