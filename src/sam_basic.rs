/// SAM BASIC tokenized program decoder
///
/// A program is a sequence of lines, each a big-endian line number, a
/// little-endian length and that many bytes of tokenized text, terminated by
/// 0xFF where the next line would start. Keywords are single bytes
/// 0x85-0xF6; functions are 0xFF followed by a byte from 0x3B. Numbers keep
/// their typed text followed by 0x0E and a hidden 5-byte float, which is
/// skipped here.
///
/// Listings are text, so every other byte is written as the character with
/// the same code point: 0x20-0x7E as ASCII, and 0x7F-0x84 or 0xF7-0xFE as
/// U+007F-U+0084 or U+00F7-U+00FE, which take two bytes in UTF-8.

use crate::error::{Result, SamError};
use crate::filesystem::{File, FileType};
use std::fmt::Write;

/// First token byte covered by the keyword table
pub const FIRST_TOKEN: u8 = 0x3B;
/// Last token byte covered by the keyword table
pub const LAST_TOKEN: u8 = 0xF6;
/// Number of keyword table entries
pub const KEYWORD_COUNT: usize = (LAST_TOKEN - FIRST_TOKEN) as usize + 1;

const END_OF_PROGRAM: u8 = 0xFF;
const FUNCTION_PREFIX: u8 = 0xFF;
const NUMBER_MARKER: u8 = 0x0E;
const NUMBER_SIZE: usize = 5;
const NEWLINE: u8 = 0x0D;

/// SAM BASIC keywords for tokens 0x3B-0xF6 ("-" marks unused tokens)
pub const SAM_KEYWORDS: [&str; KEYWORD_COUNT] = [
    // 0x3B
    "PI", "RND", "POINT", "FREE", "LENGTH", "ITEM",
    // 0x41
    "ATTR", "FN", "BIN", "XMOUSE", "YMOUSE", "XPEN",
    // 0x47
    "YPEN", "RAMTOP", "-", "INSTR", "INKEY$", "SCREEN$",
    // 0x4D
    "MEM$", "-", "PATH$", "STRING$", "-", "-",
    // 0x53
    "SIN", "COS", "TAN", "ASN", "ACS", "ATN",
    // 0x59
    "LN", "EXP", "ABS", "SGN", "SQR", "INT",
    // 0x5F
    "USR", "IN", "PEEK", "DPEEK", "DVAR", "SVAR",
    // 0x65
    "BUTTON", "EOF", "PTR", "-", "UDG", "-",
    // 0x6B
    "LEN", "CODE", "VAL$", "VAL", "TRUNC$", "CHR$",
    // 0x71
    "STR$", "BIN$", "HEX$", "USR$", "-", "NOT",
    // 0x77
    "-", "-", "-", "MOD", "DIV", "BOR",
    // 0x7D
    "-", "BAND", "OR", "AND", "<>", "<=",
    // 0x83
    ">=", "-", "USING", "WRITE", "AT", "TAB",
    // 0x89
    "OFF", "WHILE", "UNTIL", "LINE", "THEN", "TO",
    // 0x8F
    "STEP", "DIR", "FORMAT", "ERASE", "MOVE", "SAVE",
    // 0x95
    "LOAD", "MERGE", "VERIFY", "OPEN", "CLOSE", "CIRCLE",
    // 0x9B
    "PLOT", "LET", "BLITZ", "BORDER", "CLS", "PALETTE",
    // 0xA1
    "PEN", "PAPER", "FLASH", "BRIGHT", "INVERSE", "OVER",
    // 0xA7
    "FATPIX", "CSIZE", "BLOCKS", "MODE", "GRAB", "PUT",
    // 0xAD
    "BEEP", "SOUND", "NEW", "RUN", "STOP", "CONTINUE",
    // 0xB3
    "CLEAR", "GO TO", "GO SUB", "RETURN", "REM", "READ",
    // 0xB9
    "DATA", "RESTORE", "PRINT", "LPRINT", "LIST", "LLIST",
    // 0xBF
    "DUMP", "FOR", "NEXT", "PAUSE", "DRAW", "DEFAULT",
    // 0xC5
    "DIM", "INPUT", "RANDOMIZE", "DEF FN", "DEF KEYCODE", "DEF PROC",
    // 0xCB
    "END PROC", "RENUM", "DELETE", "REF", "COPY", "-",
    // 0xD1
    "KEYIN", "LOCAL", "LOOP IF", "DO", "LOOP", "EXIT IF",
    // 0xD7
    "IF", "IF", "ELSE", "ELSE", "END IF", "KEY",
    // 0xDD
    "ON ERROR", "ON", "GET", "OUT", "POKE", "DPOKE",
    // 0xE3
    "RENAME", "CALL", "ROLL", "SCROLL", "SCREEN", "DISPLAY",
    // 0xE9
    "BOOT", "LABEL", "FILL", "WINDOW", "AUTO", "POP",
    // 0xEF
    "RECORD", "DEVICE", "PROTECT", "HIDE", "ZAP", "POW",
    // 0xF5
    "BOOM", "ZOOM",
];

/// Keyword text for each token
#[derive(Debug, Clone)]
pub struct KeywordTable {
    keywords: Vec<String>,
}

impl KeywordTable {
    /// Build a table from keywords for tokens 0x3B upwards
    ///
    /// Every token up to 0xF6 needs an entry; the first missing token is
    /// reported as [`SamError::UnknownToken`].
    pub fn new<I, S>(keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords: Vec<String> = keywords.into_iter().map(Into::into).collect();
        if keywords.len() < KEYWORD_COUNT {
            return Err(SamError::UnknownToken(FIRST_TOKEN + keywords.len() as u8));
        }
        Ok(Self { keywords })
    }

    /// The SAM BASIC keyword table
    pub fn sam() -> Self {
        Self {
            keywords: SAM_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Keyword for a token byte
    pub fn lookup(&self, token: u8) -> Result<&str> {
        token
            .checked_sub(FIRST_TOKEN)
            .and_then(|index| self.keywords.get(index as usize))
            .map(String::as_str)
            .ok_or(SamError::UnknownToken(token))
    }
}

/// Decoder from tokenized SAM BASIC to a text listing
pub struct SamBasicDecoder<'a> {
    keywords: &'a KeywordTable,
}

impl<'a> SamBasicDecoder<'a> {
    /// Create a decoder using `keywords`
    pub fn new(keywords: &'a KeywordTable) -> Self {
        Self { keywords }
    }

    /// Decode a program to a string
    pub fn decode(&self, data: &[u8]) -> Result<String> {
        let mut output = String::new();
        self.decode_to(data, &mut output)?;
        Ok(output)
    }

    /// Decode a program, writing the listing to `out`
    pub fn decode_to<W: Write>(&self, data: &[u8], out: &mut W) -> Result<()> {
        let mut pos = 0;

        while pos < data.len() && data[pos] != END_OF_PROGRAM {
            if pos + 4 > data.len() {
                log::warn!("Program ends inside the header of a line at offset {}", pos);
                break;
            }

            let line_num = u16::from_be_bytes([data[pos], data[pos + 1]]);
            let line_len = u16::from_le_bytes([data[pos + 2], data[pos + 3]]) as usize;
            pos += 4;

            let line_end = pos + line_len;
            let actual_end = line_end.min(data.len());
            if actual_end < line_end {
                log::warn!("Line {} is truncated", line_num);
            }

            write!(out, "{:>5} ", line_num)?;
            if !self.decode_line(&data[pos..actual_end], out)? {
                out.write_char('\n')?;
            }

            pos = line_end;
        }

        Ok(())
    }

    /// Decode the body of one line; returns whether it ended with a line break
    fn decode_line<W: Write>(&self, data: &[u8], out: &mut W) -> Result<bool> {
        let mut space_before = true;
        let mut at_break = false;
        let mut pos = 0;

        while pos < data.len() {
            let byte = data[pos];
            pos += 1;

            match byte {
                FUNCTION_PREFIX => {
                    let Some(&token) = data.get(pos) else {
                        break;
                    };
                    pos += 1;
                    self.write_keyword(token, &mut space_before, out)?;
                    at_break = false;
                }
                NUMBER_MARKER => {
                    pos += NUMBER_SIZE;
                }
                NEWLINE => {
                    out.write_char('\n')?;
                    space_before = false;
                    at_break = true;
                }
                0x00..=0x1F => {
                    write!(out, "{{{}}}", byte)?;
                    at_break = false;
                }
                0x85..=LAST_TOKEN => {
                    self.write_keyword(byte, &mut space_before, out)?;
                    at_break = false;
                }
                _ => {
                    out.write_char(byte as char)?;
                    space_before = false;
                    at_break = false;
                }
            }
        }

        Ok(at_break)
    }

    fn write_keyword<W: Write>(&self, token: u8, space_before: &mut bool, out: &mut W) -> Result<()> {
        let keyword = self.keywords.lookup(token)?;
        if !*space_before {
            out.write_char(' ')?;
        }
        out.write_str(keyword)?;
        out.write_char(' ')?;
        *space_before = true;
        Ok(())
    }
}

/// Decode a SAM BASIC program with the standard keyword table
pub fn decode_sam_basic(data: &[u8]) -> Result<String> {
    let keywords = KeywordTable::sam();
    SamBasicDecoder::new(&keywords).decode(data)
}

/// Check if a file holds a SAM BASIC program
pub fn can_decode_sam_basic(file: &File) -> bool {
    file.header.file_type == FileType::SamBasic
}

/// Decode a file read from disk
///
/// # Returns
/// * `Ok(Some(text))` if successfully decoded
/// * `Ok(None)` if not a SAM BASIC file
/// * `Err(e)` if decoding failed
pub fn decode_sam_basic_file(file: &File) -> Result<Option<String>> {
    if !can_decode_sam_basic(file) {
        return Ok(None);
    }
    decode_sam_basic(&file.body).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::FileHeader;

    fn stub_table() -> KeywordTable {
        KeywordTable::new((0..KEYWORD_COUNT).map(|i| format!("K{:02X}", i + FIRST_TOKEN as usize)))
            .unwrap()
    }

    fn line(number: u16, body: &[u8]) -> Vec<u8> {
        let mut data = number.to_be_bytes().to_vec();
        data.extend_from_slice(&(body.len() as u16).to_le_bytes());
        data.extend_from_slice(body);
        data
    }

    fn decode_with_stub(data: &[u8]) -> String {
        let table = stub_table();
        SamBasicDecoder::new(&table).decode(data).unwrap()
    }

    #[test]
    fn test_table_is_complete() {
        assert_eq!(KeywordTable::sam().len(), KEYWORD_COUNT);
        assert_eq!(stub_table().len(), 188);
        assert_eq!(KeywordTable::sam().lookup(0x3B).unwrap(), "PI");
        assert_eq!(KeywordTable::sam().lookup(0xBB).unwrap(), "PRINT");
        assert!(matches!(
            KeywordTable::sam().lookup(0x20),
            Err(SamError::UnknownToken(0x20))
        ));
        assert!(KeywordTable::sam().lookup(0xF7).is_err());
    }

    #[test]
    fn test_partial_table_rejected() {
        let result = KeywordTable::new(["PI", "RND"]);
        assert!(matches!(result, Err(SamError::UnknownToken(0x3D))));
    }

    #[test]
    fn test_simple_line() {
        let mut data = line(10, b"HI");
        data.push(0xFF);
        assert_eq!(decode_with_stub(&data), "   10 HI\n");
    }

    #[test]
    fn test_empty_program() {
        assert_eq!(decode_with_stub(&[0xFF]), "");
        assert_eq!(decode_with_stub(&[]), "");
    }

    #[test]
    fn test_newline_in_payload() {
        let mut data = line(20, b"A\rB");
        data.push(0xFF);
        assert_eq!(decode_with_stub(&data), "   20 A\nB\n");
    }

    #[test]
    fn test_trailing_newline_not_doubled() {
        let mut data = line(1, b"X\r");
        data.extend(line(65535, b"Y\r"));
        data.push(0xFF);
        assert_eq!(decode_with_stub(&data), "    1 X\n65535 Y\n");
    }

    #[test]
    fn test_number_shadow_skipped() {
        let mut data = line(30, &[b'1', 0x0E, 0, 0, 1, 0, 0, b';']);
        data.push(0xFF);
        assert_eq!(decode_with_stub(&data), "   30 1;\n");
    }

    #[test]
    fn test_keyword_spacing() {
        // PRINT "A": function after a literal gets a leading space
        let mut data = line(40, &[0xBB, b'"', b'A', b'"', 0xFF, 0x3B, b'+', b'1']);
        data.push(0xFF);
        assert_eq!(decode_with_stub(&data), "   40 KBB \"A\" K3B +1\n");
    }

    #[test]
    fn test_consecutive_keywords() {
        let mut data = line(50, &[0xD7, 0xFF, 0x3C, 0x8D, 0xB7]);
        data.push(0xFF);
        assert_eq!(decode_with_stub(&data), "   50 KD7 K3C K8D KB7 \n");
    }

    #[test]
    fn test_high_bytes_map_to_code_points() {
        let mut data = line(70, &[b'A', 0x7F, 0x80, 0x84, 0xF7, 0xFE]);
        data.push(0xFF);
        let listing = decode_with_stub(&data);
        assert_eq!(listing, "   70 A\u{7F}\u{80}\u{84}\u{F7}\u{FE}\n");
        assert_eq!(&listing.as_bytes()[7..10], &[0x7F, 0xC2, 0x80]);
    }

    #[test]
    fn test_control_codes() {
        let mut data = line(60, &[0x10, 0x03, b'X']);
        data.push(0xFF);
        assert_eq!(decode_with_stub(&data), "   60 {16}{3}X\n");
    }

    #[test]
    fn test_sam_keywords() {
        let mut data = line(10, &[0xBB, b'1', 0x0E, 0, 0, 1, 0, 0, 0x0D]);
        data.extend(line(20, &[0xB4, b'1', b'0', 0x0E, 0, 0, 10, 0, 0, 0x0D]));
        data.push(0xFF);
        assert_eq!(
            decode_sam_basic(&data).unwrap(),
            "   10 PRINT 1\n   20 GO TO 10\n"
        );
    }

    #[test]
    fn test_unknown_escape_token() {
        let mut data = line(10, &[0xFF, 0x10]);
        data.push(0xFF);
        let table = stub_table();
        let result = SamBasicDecoder::new(&table).decode(&data);
        assert!(matches!(result, Err(SamError::UnknownToken(0x10))));
    }

    #[test]
    fn test_truncated_program() {
        let data = line(10, b"ABCDEF");
        assert_eq!(decode_with_stub(&data[..7]), "   10 ABC\n");
        assert_eq!(decode_with_stub(&[0x00, 0x0A]), "");
    }

    #[test]
    fn test_decode_file() {
        let mut body = line(10, b"OK");
        body.push(0xFF);
        let mut file = File {
            header: FileHeader {
                file_type: FileType::SamBasic,
                length_mod_16k: body.len() as u16,
                page_offset: 0,
                pages: 0,
                start_page: 0,
            },
            body,
        };
        assert_eq!(decode_sam_basic_file(&file).unwrap(), Some("   10 OK\n".to_string()));

        file.header.file_type = FileType::Code;
        assert_eq!(decode_sam_basic_file(&file).unwrap(), None);
    }
}
