//! Splitting input text into numbered line chunks.

/// A line with its 1-based position in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberedLine<'t> {
    pub line_number: usize,
    pub text: &'t str,
}

/// A contiguous run of lines handed to one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk<'t> {
    pub lines: Vec<NumberedLine<'t>>,
}

/// Result of splitting: the chunks plus the counters the sequential driver
/// would report for the same input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split<'t> {
    pub chunks: Vec<Chunk<'t>>,
    pub lines_read: usize,
    pub trailing_blank: usize,
}

/// Number every line of `text`, drop trailing blank lines, and cut the rest
/// into at most `workers` chunks of near-equal size.
pub fn split_chunks(text: &str, workers: usize) -> Split<'_> {
    let mut lines: Vec<NumberedLine<'_>> = text
        .lines()
        .enumerate()
        .map(|(idx, text)| NumberedLine {
            line_number: idx + 1,
            text,
        })
        .collect();
    let lines_read = lines.len();

    let keep = lines
        .iter()
        .rposition(|l| !l.text.trim().is_empty())
        .map_or(0, |idx| idx + 1);
    let trailing_blank = lines_read - keep;
    lines.truncate(keep);

    let workers = workers.max(1);
    let size = lines.len().div_ceil(workers).max(1);
    let chunks = lines
        .chunks(size)
        .map(|c| Chunk { lines: c.to_vec() })
        .collect();

    Split {
        chunks,
        lines_read,
        trailing_blank,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(split: &Split<'_>) -> Vec<Vec<usize>> {
        split
            .chunks
            .iter()
            .map(|c| c.lines.iter().map(|l| l.line_number).collect())
            .collect()
    }

    #[test]
    fn test_even_split() {
        let split = split_chunks("a\nb\nc\nd", 2);
        assert_eq!(numbers(&split), vec![vec![1, 2], vec![3, 4]]);
        assert_eq!(split.lines_read, 4);
        assert_eq!(split.trailing_blank, 0);
    }

    #[test]
    fn test_uneven_split() {
        let split = split_chunks("a\nb\nc\nd\ne", 3);
        assert_eq!(numbers(&split), vec![vec![1, 2], vec![3, 4], vec![5]]);
    }

    #[test]
    fn test_more_workers_than_lines() {
        let split = split_chunks("a\nb", 8);
        assert_eq!(numbers(&split), vec![vec![1], vec![2]]);
    }

    #[test]
    fn test_zero_workers_means_one() {
        let split = split_chunks("a\nb\nc", 0);
        assert_eq!(numbers(&split), vec![vec![1, 2, 3]]);
    }

    #[test]
    fn test_trailing_blanks_dropped_interior_kept() {
        let split = split_chunks("a\n\nb\n  \n\n", 1);
        assert_eq!(numbers(&split), vec![vec![1, 2, 3]]);
        assert_eq!(split.lines_read, 5);
        assert_eq!(split.trailing_blank, 2);
    }

    #[test]
    fn test_empty_input() {
        let split = split_chunks("", 4);
        assert!(split.chunks.is_empty());
        assert_eq!(split.lines_read, 0);
    }
}
