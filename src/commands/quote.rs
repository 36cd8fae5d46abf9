//! Print a random practice quote to stdout.

use crate::quote::QuoteDeck;

/// Prints one random quote, suitable for piping.
pub fn handle_quote() -> Result<(), anyhow::Error> {
    let deck = QuoteDeck::new();
    println!("{}", deck.current());
    Ok(())
}
