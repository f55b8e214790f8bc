//! Text console commands to protocol bytes.
//!
//! `x 10 y 20.5 f 3000 line` queues a move. Realtime bytes (`status`,
//! `stop`, ...) and raster data (`pixels 0 128 255`) can be mixed in freely.
//! The returned bytes are not doubled yet; the transport does that.

use heapless::Vec;

use crate::codec::encode;
use crate::markers::{
    Command, Parameter, CMD_RASTER_DATA_END, CMD_RASTER_DATA_START, CMD_RESUME, CMD_STATUS,
    CMD_STOP, CMD_SUPERSTATUS,
};
use crate::raster::pixel_byte;

pub const MAX_WIRE_LEN: usize = 256;

pub type WireBytes = Vec<u8, MAX_WIRE_LEN>;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    UnknownToken,
    NotNumber,
    TooLong,
}

pub fn parse_command_line(line: &str) -> Result<WireBytes, CommandError> {
    let mut out = WireBytes::new();
    let mut tokens = line.split_whitespace();
    while let Some(token) = tokens.next() {
        parse_token(token, &mut tokens, &mut out)?;
    }
    Ok(out)
}

fn parse_token<'a, I>(token: &str, tokens: &mut I, out: &mut WireBytes) -> Result<(), CommandError>
where
    I: Iterator<Item = &'a str>,
{
    if let Some(param) = parameter(token) {
        let val = parse_number(tokens.next())?;
        push_all(out, &encode(val))?;
        return push(out, param.marker());
    }
    if let Some(cmd) = command(token) {
        return push(out, cmd.marker());
    }
    match token {
        "status" => push(out, CMD_STATUS),
        "superstatus" => push(out, CMD_SUPERSTATUS),
        "stop" => push(out, CMD_STOP),
        "resume" => push(out, CMD_RESUME),
        "pixels" => {
            push(out, CMD_RASTER_DATA_START)?;
            for token in tokens.by_ref() {
                let val = token.parse::<u8>().map_err(|_| CommandError::NotNumber)?;
                push(out, pixel_byte(val))?;
            }
            push(out, CMD_RASTER_DATA_END)
        }
        _ => Err(CommandError::UnknownToken),
    }
}

fn parameter(token: &str) -> Option<Parameter> {
    let param = match token {
        "x" => Parameter::TargetX,
        "y" => Parameter::TargetY,
        "z" => Parameter::TargetZ,
        "f" | "feedrate" => Parameter::Feedrate,
        "s" | "intensity" => Parameter::Intensity,
        "d" | "duration" => Parameter::Duration,
        "p" | "pixel_width" => Parameter::PixelWidth,
        "ox" => Parameter::OffsetX,
        "oy" => Parameter::OffsetY,
        "oz" => Parameter::OffsetZ,
        _ => return None,
    };
    Some(param)
}

fn command(token: &str) -> Option<Command> {
    let cmd = match token {
        "none" => Command::None,
        "line" => Command::Line,
        "dwell" => Command::Dwell,
        "raster" => Command::Raster,
        "rel" | "relative" => Command::RefRelative,
        "abs" | "absolute" => Command::RefAbsolute,
        "ref_store" => Command::RefStore,
        "ref_restore" => Command::RefRestore,
        "home" | "homing" => Command::Homing,
        "off_store" => Command::OffsetStore,
        "off_restore" => Command::OffsetRestore,
        "air_on" => Command::AirEnable,
        "air_off" => Command::AirDisable,
        "aux_on" => Command::AuxEnable,
        "aux_off" => Command::AuxDisable,
        _ => return None,
    };
    Some(cmd)
}

fn parse_number(token: Option<&str>) -> Result<f64, CommandError> {
    if let Some(str) = token {
        if let Ok(v) = str.parse::<f64>() {
            return Ok(v);
        }
    }
    Err(CommandError::NotNumber)
}

fn push(out: &mut WireBytes, byte: u8) -> Result<(), CommandError> {
    out.push(byte).map_err(|_| CommandError::TooLong)
}

fn push_all(out: &mut WireBytes, bytes: &[u8]) -> Result<(), CommandError> {
    out.extend_from_slice(bytes).map_err(|_| CommandError::TooLong)
}
