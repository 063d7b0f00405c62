//! Terminal output for ranked matches

use crate::highlight::matched_runs;
use crate::query::topk::RankedMatch;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Print ranked matches to stdout, best first
pub fn print_matches<S: AsRef<str>>(
    items: &[S],
    ranked: &[RankedMatch],
    choice: ColorChoice,
    debug: bool,
) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(choice);
    write_matches(&mut stdout, items, ranked, debug)
}

/// Write ranked matches with matched characters highlighted.
///
/// With `debug`, each line is followed by its score and matched offsets.
pub fn write_matches<W: WriteColor, S: AsRef<str>>(
    out: &mut W,
    items: &[S],
    ranked: &[RankedMatch],
    debug: bool,
) -> io::Result<()> {
    for result in ranked {
        let Some(item) = items.get(result.index) else {
            continue;
        };
        write_match_line(out, item.as_ref(), &result.positions)?;

        if debug {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
            let positions: Vec<String> = result.positions.iter().map(|p| p.to_string()).collect();
            writeln!(
                out,
                "  score: {}; index: {}; positions: [{}]",
                result.score,
                result.index,
                positions.join(", ")
            )?;
            out.reset()?;
        }
    }
    Ok(())
}

/// Print a line with its matched runs highlighted
fn write_match_line<W: WriteColor>(out: &mut W, line: &str, positions: &[usize]) -> io::Result<()> {
    let mut written = 0;
    for run in matched_runs(line, positions) {
        // Text before match
        if run.start > written {
            write!(out, "{}", &line[written..run.start])?;
        }

        // The match itself (highlighted)
        out.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
        write!(out, "{}", &line[run.start..run.end])?;
        out.reset()?;
        written = run.end;
    }

    // Text after match
    if written < line.len() {
        write!(out, "{}", &line[written..])?;
    }
    writeln!(out)
}

/// Print a one-line summary to stderr
pub fn print_summary(matched: usize, total: usize, elapsed_ms: f64) -> io::Result<()> {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    stderr.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    write!(stderr, "{matched}")?;
    stderr.reset()?;
    writeln!(stderr, " of {total} candidates in {elapsed_ms:.2}ms")
}
