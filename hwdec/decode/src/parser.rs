/*!
    Streaming access-unit parser.
*/

use hwdec_types::{CodecId, DecodeBackend, Error, Result};

/**
    Accumulates raw bytes into one complete access unit at a time.

    The current packet is owned here and stays valid until the next
    [`parse`](Self::parse) call or until the session submits it.
*/
pub struct BitstreamParser<B: DecodeBackend> {
    parser: B::Parser,
    packet: Vec<u8>,
    bytes_consumed: u64,
}

impl<B: DecodeBackend> BitstreamParser<B> {
    pub(crate) fn new(backend: &B, codec: CodecId) -> Result<Self> {
        let parser = backend
            .create_parser(codec)
            .map_err(|e| Error::backend_init("init parser", e))?;
        Ok(Self {
            parser,
            packet: Vec::new(),
            bytes_consumed: 0,
        })
    }

    /**
        Feed bytes, stopping at an access-unit boundary. Returns how many
        bytes were consumed, which may be fewer than supplied.
    */
    pub(crate) fn parse(&mut self, backend: &B, codec: &mut B::Codec, data: &[u8]) -> usize {
        let consumed = backend.parse(&mut self.parser, codec, data, &mut self.packet);
        self.bytes_consumed += consumed as u64;
        consumed
    }

    /**
        Returns true if a complete packet is buffered and ready for decode.
    */
    pub fn is_frame_available(&self) -> bool {
        !self.packet.is_empty()
    }

    pub fn packet(&self) -> &[u8] {
        &self.packet
    }

    /// Total bytes consumed across all parse calls.
    pub fn bytes_consumed(&self) -> u64 {
        self.bytes_consumed
    }

    pub(crate) fn consume_packet(&mut self) {
        self.packet.clear();
    }
}
