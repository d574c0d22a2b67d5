// src/proto/parser.rs
use std::str::FromStr;

use thiserror::Error;

use super::command::{GammaSetting, MipiRefresh, Panel, RefreshRate, Resolution};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty value")]
    Empty,
    #[error("invalid {0}: {1}")]
    BadEnum(&'static str, String),
}

/* ---------- enum string helpers & FromStr impls ---------- */

pub fn gamma_setting_to_str(g: GammaSetting) -> &'static str {
    match g {
        GammaSetting::Gs22Lreg10 => "gs2.2-lreg1.0",
        GammaSetting::Gs10Lreg10 => "gs1.0-lreg1.0",
        GammaSetting::Gs22Lreg22 => "gs2.2-lreg2.2",
        GammaSetting::DefaultFlash => "flash",
    }
}

pub fn resolution_to_str(r: Resolution) -> &'static str {
    match r {
        Resolution::Res640x480 => "640x480",
        Resolution::Res660x504 => "660x504",
    }
}

pub fn refresh_rate_to_str(r: RefreshRate) -> &'static str {
    match r {
        RefreshRate::Hz30 => "30",
        RefreshRate::Hz37_5 => "37.5",
        RefreshRate::Hz50 => "50",
        RefreshRate::Hz60 => "60",
        RefreshRate::Hz75 => "75",
    }
}

fn normalized(s: &str) -> Result<String, ParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(s.to_ascii_lowercase())
}

impl FromStr for Panel {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalized(s)?.as_str() {
            "all" | "rgb" => Ok(Panel::All),
            "red" | "r" => Ok(Panel::Red),
            "green" | "g" => Ok(Panel::Green),
            "blue" | "b" => Ok(Panel::Blue),
            _ => Err(ParseError::BadEnum("panel", s.to_string())),
        }
    }
}

impl FromStr for GammaSetting {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalized(s)?.as_str() {
            "gs2.2-lreg1.0" => Ok(GammaSetting::Gs22Lreg10),
            "gs1.0-lreg1.0" => Ok(GammaSetting::Gs10Lreg10),
            "gs2.2-lreg2.2" => Ok(GammaSetting::Gs22Lreg22),
            "flash" | "default" => Ok(GammaSetting::DefaultFlash),
            _ => Err(ParseError::BadEnum("gamma setting", s.to_string())),
        }
    }
}

impl FromStr for Resolution {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalized(s)?.as_str() {
            "640x480" => Ok(Resolution::Res640x480),
            "660x504" => Ok(Resolution::Res660x504),
            _ => Err(ParseError::BadEnum("resolution", s.to_string())),
        }
    }
}

impl FromStr for RefreshRate {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v = normalized(s)?;
        match v.trim_end_matches("hz") {
            "30" => Ok(RefreshRate::Hz30),
            "37.5" => Ok(RefreshRate::Hz37_5),
            "50" => Ok(RefreshRate::Hz50),
            "60" => Ok(RefreshRate::Hz60),
            "75" => Ok(RefreshRate::Hz75),
            _ => Err(ParseError::BadEnum("refresh rate", s.to_string())),
        }
    }
}

impl FromStr for MipiRefresh {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalized(s)?.trim_end_matches("hz") {
            "75" => Ok(MipiRefresh::Hz75),
            "other" => Ok(MipiRefresh::Other),
            _ => Err(ParseError::BadEnum("mipi refresh", s.to_string())),
        }
    }
}

/* ---------- tests ---------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_panels() {
        assert_eq!("all".parse::<Panel>().unwrap(), Panel::All);
        assert_eq!("RED".parse::<Panel>().unwrap(), Panel::Red);
        assert_eq!(" g ".parse::<Panel>().unwrap(), Panel::Green);
        assert_eq!("blue".parse::<Panel>().unwrap(), Panel::Blue);
    }

    #[test]
    fn gamma_setting_strings_roundtrip() {
        for g in [
            GammaSetting::Gs22Lreg10,
            GammaSetting::Gs10Lreg10,
            GammaSetting::Gs22Lreg22,
            GammaSetting::DefaultFlash,
        ] {
            assert_eq!(gamma_setting_to_str(g).parse::<GammaSetting>().unwrap(), g);
        }
    }

    #[test]
    fn refresh_rate_accepts_hz_suffix() {
        assert_eq!("37.5Hz".parse::<RefreshRate>().unwrap(), RefreshRate::Hz37_5);
        assert_eq!("75".parse::<RefreshRate>().unwrap(), RefreshRate::Hz75);
        assert_eq!(refresh_rate_to_str(RefreshRate::Hz50), "50");
    }

    #[test]
    fn test_error_cases() {
        // Empty value
        assert!(matches!("".parse::<Panel>(), Err(ParseError::Empty)));

        // Unknown values
        assert!(matches!(
            "cyan".parse::<Panel>(),
            Err(ParseError::BadEnum("panel", _))
        ));
        assert!(matches!(
            "1024x768".parse::<Resolution>(),
            Err(ParseError::BadEnum("resolution", _))
        ));
        assert!(matches!(
            "45".parse::<RefreshRate>(),
            Err(ParseError::BadEnum(_, _))
        ));
        assert_eq!(resolution_to_str(Resolution::Res660x504), "660x504");
    }
}
