//! Parsing of `/setup` arguments into a destination configuration.

use buyalert_core::{DestinationConfig, DestinationId, MAX_SYMBOL_LEN};
use thiserror::Error;

/// Shortest token address accepted from an operator.
pub const MIN_ADDRESS_LEN: usize = 60;

/// Number of positional `/setup` arguments.
pub const SETUP_ARG_COUNT: usize = 5;

pub const SETUP_EXAMPLE: &str =
    "/setup 0x049d36570d4e46f48e99674bd3fcc84644ddd6b96f7c741b1562b82f9e004dc7 ETH Ekubo 1000000 50";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SetupError {
    #[error("Expected {SETUP_ARG_COUNT} parameters, got {0}")]
    MissingArgs(usize),

    #[error("Invalid token address format")]
    InvalidAddress,

    #[error("Token symbol must be 1-{MAX_SYMBOL_LEN} characters")]
    InvalidSymbol,

    #[error("Supply must be a whole number, got {0:?}")]
    InvalidSupply(String),

    #[error("Supply must be greater than 0")]
    ZeroSupply,

    #[error("Threshold must be a number, got {0:?}")]
    InvalidThreshold(String),

    #[error("Threshold must be 0 or higher")]
    NegativeThreshold,
}

/// Parse `ADDRESS SYMBOL DEX SUPPLY THRESHOLD`.
///
/// The symbol is upper-cased, the venue title-cased and thousands separators
/// are accepted in the supply. Extra trailing arguments are ignored.
pub fn parse_setup_args(
    destination_id: DestinationId,
    args: &str,
) -> Result<DestinationConfig, SetupError> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    if parts.len() < SETUP_ARG_COUNT {
        return Err(SetupError::MissingArgs(parts.len()));
    }
    let (address, symbol, venue, supply, threshold) =
        (parts[0], parts[1], parts[2], parts[3], parts[4]);

    if !address.starts_with("0x") || address.len() < MIN_ADDRESS_LEN {
        return Err(SetupError::InvalidAddress);
    }

    let symbol_len = symbol.chars().count();
    if symbol_len == 0 || symbol_len > MAX_SYMBOL_LEN {
        return Err(SetupError::InvalidSymbol);
    }

    let supply: u64 = supply
        .replace(',', "")
        .parse()
        .map_err(|_| SetupError::InvalidSupply(supply.to_string()))?;
    if supply == 0 {
        return Err(SetupError::ZeroSupply);
    }

    let threshold: f64 = threshold
        .parse()
        .ok()
        .filter(|t: &f64| t.is_finite())
        .ok_or_else(|| SetupError::InvalidThreshold(threshold.to_string()))?;
    if threshold < 0.0 {
        return Err(SetupError::NegativeThreshold);
    }

    Ok(DestinationConfig::new(
        destination_id,
        address,
        &symbol.to_uppercase(),
        title_case(venue),
        supply,
        threshold,
    ))
}

/// "jediSWAP" -> "Jediswap", "my-dex" -> "My-Dex".
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(c);
            word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ADDR: &str = "0x049d36570d4e46f48e99674bd3fcc84644ddd6b96f7c741b1562b82f9e004dc7";

    fn parse(args: &str) -> Result<DestinationConfig, SetupError> {
        parse_setup_args(DestinationId::from("-100"), args)
    }

    #[test]
    fn test_parse_valid_setup() {
        let config = parse(&format!("{ADDR} slay ekubo 1,000,000 50")).unwrap();
        assert_eq!(config.destination_id.as_str(), "-100");
        assert_eq!(config.token_address, ADDR);
        assert_eq!(config.token_symbol.as_str(), "SLAY");
        assert_eq!(config.venue_name, "Ekubo");
        assert_eq!(config.total_supply, 1_000_000);
        assert_eq!(config.min_buy_threshold, 50.0);
        assert!(config.is_active);
    }

    #[test]
    fn test_parse_missing_args() {
        assert_eq!(parse(""), Err(SetupError::MissingArgs(0)));
        assert_eq!(
            parse(&format!("{ADDR} SLAY Ekubo 1000")),
            Err(SetupError::MissingArgs(4))
        );
    }

    #[test]
    fn test_parse_rejects_bad_address() {
        assert_eq!(
            parse("0x1234 SLAY Ekubo 1000 0"),
            Err(SetupError::InvalidAddress)
        );
        let no_prefix = ADDR.replacen("0x", "1x", 1);
        assert_eq!(
            parse(&format!("{no_prefix} SLAY Ekubo 1000 0")),
            Err(SetupError::InvalidAddress)
        );
    }

    #[test]
    fn test_parse_rejects_long_symbol() {
        assert_eq!(
            parse(&format!("{ADDR} ABCDEFGHIJK Ekubo 1000 0")),
            Err(SetupError::InvalidSymbol)
        );
    }

    #[test]
    fn test_parse_rejects_bad_supply() {
        assert_eq!(
            parse(&format!("{ADDR} SLAY Ekubo 0 0")),
            Err(SetupError::ZeroSupply)
        );
        assert_eq!(
            parse(&format!("{ADDR} SLAY Ekubo lots 0")),
            Err(SetupError::InvalidSupply("lots".to_string()))
        );
    }

    #[test]
    fn test_parse_threshold_bounds() {
        assert_eq!(
            parse(&format!("{ADDR} SLAY Ekubo 1000 -1")),
            Err(SetupError::NegativeThreshold)
        );
        assert_eq!(
            parse(&format!("{ADDR} SLAY Ekubo 1000 NaN")),
            Err(SetupError::InvalidThreshold("NaN".to_string()))
        );
        assert_eq!(parse(&format!("{ADDR} SLAY Ekubo 1000 0")).unwrap().min_buy_threshold, 0.0);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("ekubo"), "Ekubo");
        assert_eq!(title_case("jediSWAP"), "Jediswap");
        assert_eq!(title_case("my-dex"), "My-Dex");
    }
}
