//! Terminal output for search hits and run summaries

use crate::index::types::{DocKind, FlushStats, IndexStats};
use crate::query::SearchHit;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Print hits to stdout, one per line
pub fn print_hits(hits: &[SearchHit], choice: ColorChoice) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(choice);
    write_hits(&mut stdout, hits)
}

/// `path:kind: count=N avg_position=M`
pub fn write_hits<W: WriteColor>(out: &mut W, hits: &[SearchHit]) -> io::Result<()> {
    for hit in hits {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
        write!(out, "{}", hit.path)?;
        out.reset()?;
        write!(out, ":")?;

        let kind_color = match hit.kind {
            DocKind::Path => Color::Cyan,
            DocKind::File => Color::Blue,
        };
        out.set_color(ColorSpec::new().set_fg(Some(kind_color)))?;
        write!(out, "{}", hit.kind.label())?;
        out.reset()?;
        write!(out, ": count=")?;

        out.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
        write!(out, "{}", hit.count)?;
        out.reset()?;
        writeln!(out, " avg_position={}", hit.avg_position)?;
    }
    Ok(())
}

/// Summary printed after `index`
pub fn print_index_summary(stats: &IndexStats, flushed: &FlushStats) {
    println!(
        "Indexed {} files ({} binary, {} failed)",
        stats.files_indexed, stats.binary_skipped, stats.files_failed
    );
    println!(
        "Recorded {} tokens, wrote {} matches ({} new words)",
        stats.tokens, flushed.matches_written, flushed.words_created
    );
    if stats.tokens_dropped > 0 {
        eprintln!(
            "({} tokens dropped: word table full)",
            stats.tokens_dropped
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termcolor::NoColor;

    #[test]
    fn test_plain_hit_lines() {
        let hits = vec![
            SearchHit {
                kind: DocKind::Path,
                doc_id: 1,
                path: "/tmp/a.txt".into(),
                count: 1,
                avg_position: 2,
            },
            SearchHit {
                kind: DocKind::File,
                doc_id: 2,
                path: "/tmp/a.txt".into(),
                count: 2,
                avg_position: 2,
            },
        ];
        let mut out = NoColor::new(Vec::new());
        write_hits(&mut out, &hits).unwrap();

        let text = String::from_utf8(out.into_inner()).unwrap();
        assert_eq!(
            text,
            "/tmp/a.txt:path: count=1 avg_position=2\n/tmp/a.txt:file: count=2 avg_position=2\n"
        );
    }
}
