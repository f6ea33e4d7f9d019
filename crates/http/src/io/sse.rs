use bytes::BytesMut;

use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    ChunksError(ChunksError),
}

/// A record read from the event stream.
#[derive(Debug, PartialEq, Eq)]
pub enum Event {
    /// The joined `data` lines of one record.
    Data(String),
    /// The record is not valid UTF-8.
    Malformed,
}

/// A type for reading server-sent events from a chunk stream.
///
/// Records are buffered as raw bytes, so a chunk boundary may fall
/// anywhere, including inside a multi-byte character.
pub struct Sse {
    buf: BytesMut,
    scan: Scan,
    chunks: Chunks,
    eof: bool,
}

/// How far the buffer has been searched for a record end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Scan {
    /// Start of the line being searched.
    line_start: usize,
    /// Every byte before this has been looked at.
    pos: usize,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: BytesMut::new(),
            scan: Scan::default(),
            chunks,
            eof: false,
        }
    }

    pub async fn next_event(&mut self) -> Result<Option<Event>, Error> {
        loop {
            // Drain the buffered records before touching the stream, one
            // chunk may carry several of them.
            if let Some(event) = self.try_parse_event() {
                return Ok(Some(event));
            }

            if self.eof {
                return Ok(self.take_trailing_event());
            }

            match self.chunks.next_chunk().await.map_err(Error::ChunksError)? {
                Some(bytes) => self.buf.extend_from_slice(&bytes),
                None => self.eof = true,
            }
        }
    }

    fn try_parse_event(&mut self) -> Option<Event> {
        // event         = *( comment / field ) end-of-line
        // field         = 1*name-char [ colon [ space ] *any-char ] end-of-line
        // end-of-line   = ( cr lf / lf )
        while let Some((record_len, consumed)) =
            find_record_end(&self.buf, &mut self.scan)
        {
            let record = self.buf.split_to(consumed);
            if let Some(event) = parse_record(&record[..record_len]) {
                return Some(event);
            }
        }
        None
    }

    /// The stream has ended, whatever left in the buffer is the last
    /// record even if it is not terminated by a blank line.
    fn take_trailing_event(&mut self) -> Option<Event> {
        if self.buf.is_empty() {
            return None;
        }
        self.scan = Scan::default();
        let record = self.buf.split();
        parse_record(&record)
    }
}

/// Finds the first blank line, returning the length of the record before
/// it and the number of bytes to consume.
///
/// The search resumes from `scan`, so bytes of a partial record are looked
/// at only once no matter how many chunks it arrives in. `scan` is reset
/// once a record end is found, as the caller consumes it.
fn find_record_end(buf: &[u8], scan: &mut Scan) -> Option<(usize, usize)> {
    while let Some(offset) = buf[scan.pos..].iter().position(|b| *b == b'\n') {
        let idx = scan.pos + offset;
        let line = &buf[scan.line_start..idx];
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() {
            let record_len = scan.line_start;
            *scan = Scan::default();
            return Some((record_len, idx + 1));
        }
        scan.line_start = idx + 1;
        scan.pos = idx + 1;
    }
    scan.pos = buf.len();
    None
}

fn parse_record(record: &[u8]) -> Option<Event> {
    let Ok(text) = std::str::from_utf8(record) else {
        return Some(Event::Malformed);
    };

    let mut data: Option<String> = None;
    for line in text.lines() {
        // Comments and fields other than `data` are not supported.
        let Some(value) = line.strip_prefix("data:") else {
            continue;
        };
        let value = value.strip_prefix(' ').unwrap_or(value);
        match &mut data {
            Some(data) => {
                data.push('\n');
                data.push_str(value);
            }
            None => data = Some(value.to_owned()),
        }
    }
    data.map(Event::Data)
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn data(s: &str) -> Event {
        Event::Data(s.to_owned())
    }

    #[tokio::test]
    async fn test_normal_events() {
        let chunks = Chunks::from_vec_deque(
            vec![
                Bytes::from_static(b"data: hello\n\n"),
                Bytes::from_static(b"data: bye\n\n"),
            ]
            .into(),
        );
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), data("hello"));
        assert_eq!(sse.next_event().await.unwrap().unwrap(), data("bye"));
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_several_events_in_one_chunk() {
        let chunks = Chunks::from_vec_deque(
            vec![Bytes::from_static(b"data: a\n\ndata: b\n\ndata: c\n\n")]
                .into(),
        );
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), data("a"));
        assert_eq!(sse.next_event().await.unwrap().unwrap(), data("b"));
        assert_eq!(sse.next_event().await.unwrap().unwrap(), data("c"));
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_quirk_streaming() {
        let chunks = Chunks::from_vec_deque(
            vec![
                Bytes::from_static(b"data:"),
                Bytes::from_static(b" hello\n"),
                Bytes::from_static(b"\n"),
            ]
            .into(),
        );
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), data("hello"));
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_split_multibyte_character() {
        let bytes = "data: 日本\n\n".as_bytes();
        // Split in the middle of the first character.
        let chunks = Chunks::from_vec_deque(
            vec![
                Bytes::copy_from_slice(&bytes[..7]),
                Bytes::copy_from_slice(&bytes[7..]),
            ]
            .into(),
        );
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), data("日本"));
    }

    #[tokio::test]
    async fn test_crlf_comments_and_multiline() {
        let chunks = Chunks::from_vec_deque(
            vec![Bytes::from_static(
                b": keep-alive\r\n\r\nevent: message\r\ndata: one\r\ndata:two\r\n\r\n",
            )]
            .into(),
        );
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), data("one\ntwo"));
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_trailing_event_without_blank_line() {
        let chunks = Chunks::from_vec_deque(
            vec![Bytes::from_static(b"data: hello\n\ndata: bye\n")].into(),
        );
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), data("hello"));
        assert_eq!(sse.next_event().await.unwrap().unwrap(), data("bye"));
        assert_eq!(sse.next_event().await.unwrap(), None);

        let chunks = Chunks::from_vec_deque(
            vec![Bytes::from_static(b"xxxxxx\n")].into(),
        );
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_data() {
        let chunks = Chunks::from_vec_deque(
            vec![
                Bytes::from_static(b"data: \xff\xfe\n\n"),
                Bytes::from_static(b"data: ok\n\n"),
            ]
            .into(),
        );
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), Event::Malformed);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), data("ok"));
    }

    #[test]
    fn test_find_record_end_resumes() {
        let mut scan = Scan::default();
        assert_eq!(find_record_end(b"data: he", &mut scan), None);
        assert_eq!(scan, Scan { line_start: 0, pos: 8 });

        assert_eq!(find_record_end(b"data: hello\r\nid", &mut scan), None);
        assert_eq!(scan, Scan { line_start: 13, pos: 15 });

        assert_eq!(
            find_record_end(b"data: hello\r\nid: 1\n\nda", &mut scan),
            Some((19, 20))
        );
        assert_eq!(scan, Scan::default());
    }

    #[tokio::test]
    async fn test_record_in_tiny_chunks() {
        let payload = format!("data: {}\n\ndata: bye\n\n", "x".repeat(4096));
        let chunks = Chunks::from_vec_deque(
            payload
                .as_bytes()
                .chunks(3)
                .map(Bytes::copy_from_slice)
                .collect(),
        );
        let mut sse = Sse::new(chunks);
        assert_eq!(
            sse.next_event().await.unwrap().unwrap(),
            data(&"x".repeat(4096))
        );
        assert_eq!(sse.next_event().await.unwrap().unwrap(), data("bye"));
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_chunk_error() {
        let chunks = Chunks::from_results(vec![
            Ok(Bytes::from_static(b"data: hello\n\n")),
            Err(ChunksError {
                message: "connection reset".to_owned(),
            }),
        ]);
        let mut sse = Sse::new(chunks);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), data("hello"));
        assert_eq!(
            sse.next_event().await.unwrap_err(),
            Error::ChunksError(ChunksError {
                message: "connection reset".to_owned(),
            })
        );
    }
}
