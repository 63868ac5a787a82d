use thiserror::Error;

use super::track::Cue;

#[derive(Error, Debug)]
pub enum SubtitleError {
    #[error("line {line}: invalid timestamp '{value}'")]
    Timestamp { line: usize, value: String },

    #[error("line {line}: malformed cue timing '{value}'")]
    Timing { line: usize, value: String },

    #[error("missing WEBVTT header")]
    MissingHeader,

    #[error("unsupported subtitle format '{0}'")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parse SubRip (`.srt`) content.
pub fn parse_srt(content: &str) -> Result<Vec<Cue>, SubtitleError> {
    parse_blocks(content, 0)
}

/// Parse WebVTT content. The header block and NOTE/STYLE/REGION blocks are skipped.
pub fn parse_vtt(content: &str) -> Result<Vec<Cue>, SubtitleError> {
    let content = content.trim_start_matches('\u{feff}');
    if !content.starts_with("WEBVTT") {
        return Err(SubtitleError::MissingHeader);
    }
    parse_blocks(content, 1)
}

fn parse_blocks(content: &str, skip_blocks: usize) -> Result<Vec<Cue>, SubtitleError> {
    let content = content.trim_start_matches('\u{feff}').replace("\r\n", "\n");
    let mut cues = Vec::new();

    for (line_offset, block) in split_blocks(&content).into_iter().skip(skip_blocks) {
        let first = block.first().map(|line| line.trim()).unwrap_or_default();
        if first.starts_with("NOTE") || first == "STYLE" || first == "REGION" {
            continue;
        }

        // An optional cue identifier may precede the timing line.
        let Some(timing_index) = block.iter().position(|line| line.contains("-->")) else {
            continue;
        };
        let line = line_offset + timing_index + 1;
        let (start, end) = parse_timing(block[timing_index], line)?;

        let text = block[timing_index + 1..]
            .iter()
            .map(|line| strip_tags(line.trim_end()))
            .collect::<Vec<_>>()
            .join("\n");
        if text.trim().is_empty() {
            continue;
        }

        cues.push(Cue { start, end, text });
    }

    Ok(cues)
}

/// Blank-line separated blocks with the zero-based line index each starts on.
fn split_blocks(content: &str) -> Vec<(usize, Vec<&str>)> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut start_line = 0;

    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push((start_line, std::mem::take(&mut current)));
            }
            continue;
        }
        if current.is_empty() {
            start_line = index;
        }
        current.push(line);
    }
    if !current.is_empty() {
        blocks.push((start_line, current));
    }
    blocks
}

fn parse_timing(value: &str, line: usize) -> Result<(f64, f64), SubtitleError> {
    let (start, rest) = value.split_once("-->").ok_or_else(|| SubtitleError::Timing {
        line,
        value: value.to_string(),
    })?;
    // WebVTT cue settings follow the end timestamp.
    let end = rest.split_whitespace().next().unwrap_or_default();

    let start = parse_timestamp(start.trim(), line)?;
    let end = parse_timestamp(end, line)?;
    if end < start {
        return Err(SubtitleError::Timing {
            line,
            value: value.to_string(),
        });
    }
    Ok((start, end))
}

/// `hh:mm:ss,mmm`, `hh:mm:ss.mmm` or `mm:ss.mmm` to seconds.
fn parse_timestamp(value: &str, line: usize) -> Result<f64, SubtitleError> {
    let invalid = || SubtitleError::Timestamp {
        line,
        value: value.to_string(),
    };

    let parts: Vec<&str> = value.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [m, s] => ("0", *m, *s),
        _ => return Err(invalid()),
    };

    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
    let seconds: f64 = seconds.replace(',', ".").parse().map_err(|_| invalid())?;
    if minutes >= 60 || !(0.0..60.0).contains(&seconds) {
        return Err(invalid());
    }

    Ok(f64::from(hours) * 3600.0 + f64::from(minutes) * 60.0 + seconds)
}

fn strip_tags(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_tag = false;
    for ch in line.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}
