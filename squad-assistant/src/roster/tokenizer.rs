// Quote-aware CSV tokenizer.
//
// A single pass over the input characters with two states. Outside quotes a
// comma ends the field and a line break (LF or CRLF) ends the record; inside
// quotes everything is literal except `""` (an escaped quote) and the closing
// quote. Quoted fields may therefore span several physical lines.

/// One tokenized record: the ordered fields, without any semantic meaning.
pub type RawRow = Vec<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unquoted,
    Quoted,
}

/// Split raw CSV text into rows of fields.
///
/// A leading byte-order mark and surrounding whitespace are stripped first,
/// so empty or whitespace-only input yields no rows at all and a trailing
/// newline never produces a phantom record. Row lengths are not checked here.
pub fn tokenize(text: &str) -> Vec<RawRow> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text).trim();
    let mut rows = Vec::new();
    if text.is_empty() {
        return rows;
    }

    let mut state = State::Unquoted;
    let mut row: RawRow = Vec::new();
    let mut field = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Unquoted => match c {
                ',' => row.push(std::mem::take(&mut field)),
                '\r' if chars.peek() == Some(&'\n') => {
                    chars.next();
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                '\n' => {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                '"' => state = State::Quoted,
                _ => field.push(c),
            },
            State::Quoted => match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => state = State::Unquoted,
                _ => field.push(c),
            },
        }
    }

    // Flush whatever is pending, even without a trailing terminator. An
    // unterminated quote simply runs to the end of the input.
    row.push(field);
    rows.push(row);
    rows
}
