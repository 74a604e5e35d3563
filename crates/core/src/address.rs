//! Token address helpers.

/// Separator after which a stored token address may carry extra data
/// (e.g. a pool suffix pasted together with the address).
pub const ADDRESS_SEPARATOR: char = '-';

/// Return the canonical token address used for all outbound calls.
///
/// Everything from the first [`ADDRESS_SEPARATOR`] onwards is dropped.
/// Addresses without a separator are returned unchanged.
pub fn normalize_token_address(address: &str) -> &str {
    match address.find(ADDRESS_SEPARATOR) {
        Some(idx) => &address[..idx],
        None => address,
    }
}

/// Shorten an address for display: `0x049d3657...9e004dc7`.
pub fn abbreviate_address(address: &str) -> String {
    if address.len() <= 18 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..10], &address[address.len() - 8..])
}
