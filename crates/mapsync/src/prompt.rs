use std::io;

use console::Term;
use mapsync_fetch::Variant;

/// Map a menu answer to a variant. Anything unrecognised means full.
pub fn parse_choice(input: &str) -> Variant {
    match input.trim() {
        "2" => Variant::NoVideo,
        "3" => Variant::Mini,
        other => other.parse().unwrap_or(Variant::Full),
    }
}

/// Ask which variant to download. Non-interactive runs get full.
pub fn choose_variant(term: &Term) -> Variant {
    if !term.is_term() {
        return Variant::Full;
    }
    ask(term).unwrap_or(Variant::Full)
}

fn ask(term: &Term) -> io::Result<Variant> {
    term.write_line("Which download variant?")?;
    term.write_line("  1) full     everything, video included")?;
    term.write_line("  2) novideo  without video")?;
    term.write_line("  3) mini     beatmap files only")?;
    term.write_str("choice [1]: ")?;
    Ok(parse_choice(&term.read_line()?))
}
