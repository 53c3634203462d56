use std::collections::HashMap;
use std::error::Error;
use std::fmt;

use crate::core::data::colour::Colour;
use crate::core::data::complex::Complex;
use crate::core::data::fractal_params::{
    FractalParams, FractalParamsError, HandlerKind, Precision, PngEncoder, SaveParams, Strategy,
};

/// Every way a `application/x-www-form-urlencoded` body can fail to become
/// a [`FractalParams`]/[`SaveParams`], named precisely enough that the HTTP
/// adapter's 400 response can point at the offending field.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamsParseError {
    MissingField { field: &'static str },
    NotAnInteger { field: &'static str },
    NotAFiniteNumber { field: &'static str },
    Invalid { field: &'static str, reason: FractalParamsError },
}

impl fmt::Display for ParamsParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { field } => write!(f, "missing field: {field}"),
            Self::NotAnInteger { field } => write!(f, "field {field} is not a valid integer"),
            Self::NotAFiniteNumber { field } => write!(f, "field {field} is not a finite number"),
            Self::Invalid { field, reason } => write!(f, "field {field} is invalid: {reason}"),
        }
    }
}

impl Error for ParamsParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

type Fields<'a> = HashMap<&'a str, &'a str>;

fn required<'a>(fields: &Fields<'a>, key: &'static str) -> Result<&'a str, ParamsParseError> {
    fields
        .get(key)
        .copied()
        .ok_or(ParamsParseError::MissingField { field: key })
}

fn parse_u64(fields: &Fields, key: &'static str) -> Result<u64, ParamsParseError> {
    required(fields, key)?
        .parse::<u64>()
        .map_err(|_| ParamsParseError::NotAnInteger { field: key })
}

fn parse_u32(fields: &Fields, key: &'static str) -> Result<u32, ParamsParseError> {
    required(fields, key)?
        .parse::<u32>()
        .map_err(|_| ParamsParseError::NotAnInteger { field: key })
}

fn parse_f64(fields: &Fields, key: &'static str) -> Result<f64, ParamsParseError> {
    let raw = required(fields, key)?;
    let value: f64 = raw.parse().map_err(|_| ParamsParseError::NotAFiniteNumber { field: key })?;
    if !value.is_finite() {
        return Err(ParamsParseError::NotAFiniteNumber { field: key });
    }
    Ok(value)
}

fn parse_precision(fields: &Fields, key: &'static str) -> Result<Precision, ParamsParseError> {
    match fields.get(key).copied().map(str::to_ascii_uppercase).as_deref() {
        Some("SINGLE") => Ok(Precision::Single),
        _ => Ok(Precision::Double),
    }
}

fn parse_strategy(fields: &Fields, key: &'static str) -> Result<Strategy, ParamsParseError> {
    Ok(match fields.get(key).copied().map(str::to_ascii_uppercase).as_deref() {
        Some("NAIVE") => Strategy::Naive,
        Some("DYNAMIC_BLOCK") => Strategy::Block,
        Some("DYNAMIC_BLOCK_THREADED") => Strategy::BlockThreaded,
        _ => Strategy::BlockThreadedIncremental,
    })
}

fn parse_png_encoder(fields: &Fields, key: &'static str, default: PngEncoder) -> Result<PngEncoder, ParamsParseError> {
    Ok(match fields.get(key).copied().map(str::to_ascii_uppercase).as_deref() {
        Some("A") => PngEncoder::A,
        Some("B") => PngEncoder::B,
        _ => default,
    })
}

fn parse_handler(fields: &Fields, key: &'static str) -> Result<HandlerKind, ParamsParseError> {
    Ok(match fields.get(key).copied().map(str::to_ascii_uppercase).as_deref() {
        Some("PIPELINED") => HandlerKind::Pipelined,
        Some("ASYNCHRONOUS") => HandlerKind::Asynchronous,
        _ => HandlerKind::Synchronous,
    })
}

/// Splits a comma-separated list field (e.g. `zero_rs=1.0,-0.5,-0.5`) into
/// its raw string items. An absent or empty field yields an empty list.
fn split_list<'a>(fields: &Fields<'a>, key: &'static str) -> Vec<&'a str> {
    match fields.get(key).copied() {
        Some(raw) if !raw.is_empty() => raw.split(',').collect(),
        _ => Vec::new(),
    }
}

/// Zeros/colors arrive as five equal-length comma-separated lists:
/// `zero_rs`, `zero_is` (real/imaginary parts of each zero) and
/// `zero_reds`, `zero_greens`, `zero_blues` (the matching colors), mirroring
/// how the original system reads a flat key/value body rather than a nested
/// structure.
fn parse_zeros_and_colors(fields: &Fields) -> Result<(Vec<Complex>, Vec<Colour>), ParamsParseError> {
    let real_raw = split_list(fields, "zero_rs");
    let imag_raw = split_list(fields, "zero_is");
    let red_raw = split_list(fields, "zero_reds");
    let green_raw = split_list(fields, "zero_greens");
    let blue_raw = split_list(fields, "zero_blues");

    if imag_raw.len() != real_raw.len() {
        return Err(ParamsParseError::Invalid {
            field: "zero_is",
            reason: FractalParamsError::MismatchedLengths { zeros: real_raw.len(), colors: imag_raw.len() },
        });
    }
    if red_raw.len() != real_raw.len() || green_raw.len() != real_raw.len() || blue_raw.len() != real_raw.len() {
        return Err(ParamsParseError::Invalid {
            field: "zero_reds",
            reason: FractalParamsError::MismatchedLengths { zeros: real_raw.len(), colors: red_raw.len() },
        });
    }

    let mut zeros = Vec::with_capacity(real_raw.len());
    let mut colors = Vec::with_capacity(real_raw.len());

    for i in 0..real_raw.len() {
        let real: f64 = real_raw[i].parse().map_err(|_| ParamsParseError::NotAFiniteNumber { field: "zero_rs" })?;
        let imag: f64 = imag_raw[i].parse().map_err(|_| ParamsParseError::NotAFiniteNumber { field: "zero_is" })?;
        if !real.is_finite() || !imag.is_finite() {
            return Err(ParamsParseError::NotAFiniteNumber { field: "zero_rs" });
        }
        let r: u8 = red_raw[i].parse().map_err(|_| ParamsParseError::NotAnInteger { field: "zero_reds" })?;
        let g: u8 = green_raw[i].parse().map_err(|_| ParamsParseError::NotAnInteger { field: "zero_greens" })?;
        let b: u8 = blue_raw[i].parse().map_err(|_| ParamsParseError::NotAnInteger { field: "zero_blues" })?;

        zeros.push(Complex { real, imag });
        colors.push(Colour { r, g, b });
    }

    Ok((zeros, colors))
}

/// Parses a decoded `application/x-www-form-urlencoded` body into
/// [`FractalParams`]. Pure and fully unit-testable without a server.
/// `default_png_encoder` is used only when the request omits `png_encoder`.
pub fn parse_fractal_params(
    fields: &HashMap<String, String>,
    default_png_encoder: PngEncoder,
) -> Result<FractalParams, ParamsParseError> {
    let fields: Fields = fields.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    parse_fractal_params_inner(&fields, default_png_encoder)
}

fn parse_fractal_params_inner(fields: &Fields, default_png_encoder: PngEncoder) -> Result<FractalParams, ParamsParseError> {
    let session_id = required(fields, "session_id")?.to_string();
    let request_id = parse_u64(fields, "request_id")?;
    let last_data_id = fields.get("last_data_id").and_then(|v| v.parse().ok()).unwrap_or(0);
    let last_viewport_id = fields.get("last_viewport_id").and_then(|v| v.parse().ok()).unwrap_or(0);

    let r_min = parse_f64(fields, "r_min")?;
    let i_min = parse_f64(fields, "i_min")?;
    let r_range = parse_f64(fields, "r_range")?;

    let width = parse_u32(fields, "width")?;
    let height = parse_u32(fields, "height")?;
    let max_iters = parse_u32(fields, "max_iters")?;

    let (zeros, colors) = parse_zeros_and_colors(fields)?;

    let precision = parse_precision(fields, "precision")?;
    let strategy = parse_strategy(fields, "strategy")?;
    let png_encoder = parse_png_encoder(fields, "png_encoder", default_png_encoder)?;
    let handler = parse_handler(fields, "handler")?;

    FractalParams::new(
        session_id,
        request_id,
        last_data_id,
        last_viewport_id,
        r_min,
        i_min,
        r_range,
        width,
        height,
        max_iters,
        zeros,
        colors,
        precision,
        strategy,
        png_encoder,
        handler,
    )
    .map_err(|reason| ParamsParseError::Invalid { field: "params", reason })
}

/// Parses `/save`'s body: every [`FractalParams`] field plus `save_scale`,
/// `save_file`, `save_metadata`.
pub fn parse_save_params(
    fields: &HashMap<String, String>,
    default_png_encoder: PngEncoder,
) -> Result<SaveParams, ParamsParseError> {
    let fields: Fields = fields.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    let base = parse_fractal_params_inner(&fields, default_png_encoder)?;
    let scale = parse_u32(&fields, "save_scale")?.max(1);
    let save_file = required(&fields, "save_file")?.to_string();
    let save_metadata = fields.get("save_metadata").copied().unwrap_or("").to_string();

    Ok(SaveParams {
        base,
        scale,
        save_file,
        save_metadata,
    })
}
