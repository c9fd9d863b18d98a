/*!
    Scripted in-memory backend.

    Implements [`DecodeBackend`] and [`ScaleBackend`] without any hardware
    so the session and converter logic can be exercised in tests.

    The bitstream it understands is a sequence of access units, each
    starting with [`START_CODE`] followed by the frame width and height
    as big-endian `u16`s and an arbitrary filler payload. Like a real
    elementary-stream parser, a unit is only recognized once the start
    code of the next one has been seen, or when the parser is flushed.

    Every handle the backend gives out is recorded in a shared [`Ledger`],
    which tests use to check that resources are released exactly once and
    in the expected order.
*/

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::{
    BackendError, BackendResult, CodecId, DecodeBackend, DecodedFrame, DecoderInfo, HwConfig,
    ImageLayout, PixelFormat, Received, ScaleBackend, ScalerKey, ScalingAlgorithm,
};

/// Marker that begins every access unit.
pub const START_CODE: [u8; 4] = [0, 0, 0, 1];

const FILLER: u8 = 0x55;

/**
    Build one access unit for a frame of the given size.

    Both dimensions must be nonzero.
*/
pub fn access_unit(width: u16, height: u16, payload_len: usize) -> Vec<u8> {
    let mut unit = Vec::with_capacity(START_CODE.len() + 4 + payload_len);
    unit.extend_from_slice(&START_CODE);
    unit.extend_from_slice(&width.to_be_bytes());
    unit.extend_from_slice(&height.to_be_bytes());
    unit.resize(unit.len() + payload_len, FILLER);
    unit
}

/**
    Build a stream of access units, one per `(width, height)` pair.
*/
pub fn stream(frames: &[(u16, u16)]) -> Vec<u8> {
    frames
        .iter()
        .enumerate()
        .flat_map(|(i, &(w, h))| access_unit(w, h, 32 + i * 7))
        .collect()
}

/**
    Kinds of resources handed out by the mock backend.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Device,
    Codec,
    Parser,
    Frame,
    Scaler,
}

/**
    Acquire or release of a resource.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Acquire(Resource),
    Release(Resource),
}

/**
    Record of every acquire and release, in order.
*/
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    events: Rc<RefCell<Vec<Event>>>,
}

impl Ledger {
    fn acquire(&self, resource: Resource) -> Guard {
        self.events.borrow_mut().push(Event::Acquire(resource));
        Guard {
            ledger: self.clone(),
            resource,
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn acquired(&self, resource: Resource) -> usize {
        self.count(Event::Acquire(resource))
    }

    pub fn released(&self, resource: Resource) -> usize {
        self.count(Event::Release(resource))
    }

    /// Number of handles acquired but not yet released.
    pub fn outstanding(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .map(|event| match event {
                Event::Acquire(_) => 1isize,
                Event::Release(_) => -1,
            })
            .sum::<isize>()
            .max(0) as usize
    }

    /// Resources in the order they were released.
    pub fn release_order(&self) -> Vec<Resource> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Release(resource) => Some(*resource),
                Event::Acquire(_) => None,
            })
            .collect()
    }

    fn count(&self, wanted: Event) -> usize {
        self.events.borrow().iter().filter(|e| **e == wanted).count()
    }
}

/**
    Releases its resource in the ledger when dropped.
*/
#[derive(Debug)]
struct Guard {
    ledger: Ledger,
    resource: Resource,
}

impl Drop for Guard {
    fn drop(&mut self) {
        self.ledger
            .events
            .borrow_mut()
            .push(Event::Release(self.resource));
    }
}

/**
    Capability call the backend can be told to fail.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailPoint {
    CreateDevice,
    OpenCodec,
    CreateParser,
    /// Fail the n-th frame allocation (0-based)
    AllocFrame(usize),
    CreateScaler,
}

/**
    Device type handle: index into the backend's device list.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockDeviceKind(usize);

#[derive(Debug)]
pub struct MockDevice {
    kind: MockDeviceKind,
    _guard: Guard,
}

#[derive(Debug)]
pub struct MockCodec {
    hw_format: PixelFormat,
    queue: VecDeque<(u32, u32)>,
    draining: bool,
    _guard: Guard,
}

#[derive(Debug)]
pub struct MockParser {
    buffer: Vec<u8>,
    _guard: Guard,
}

#[derive(Debug)]
pub struct MockFrame {
    width: u32,
    height: u32,
    format: PixelFormat,
    planes: Vec<(Vec<u8>, usize)>,
    _guard: Guard,
}

#[derive(Debug)]
pub struct MockScaler {
    key: ScalerKey,
    _guard: Guard,
}

struct DeviceEntry {
    name: &'static str,
    surface: PixelFormat,
}

/**
    Scripted backend; see the module documentation.
*/
pub struct MockBackend {
    ledger: Ledger,
    devices: Vec<DeviceEntry>,
    missing_decoders: Vec<CodecId>,
    hw_configs: bool,
    delay: usize,
    host_output: bool,
    fail_transfer: bool,
    surface_override: Option<PixelFormat>,
    fail_at: Option<FailPoint>,
    frames_allocated: Cell<usize>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /**
        Backend with `vaapi` and `cuda` devices and decoders for both
        codec families that emit device-resident frames immediately.
    */
    pub fn new() -> Self {
        Self {
            ledger: Ledger::default(),
            devices: vec![
                DeviceEntry {
                    name: "vaapi",
                    surface: PixelFormat::Vaapi,
                },
                DeviceEntry {
                    name: "cuda",
                    surface: PixelFormat::Cuda,
                },
            ],
            missing_decoders: Vec::new(),
            hw_configs: true,
            delay: 0,
            host_output: false,
            fail_transfer: false,
            surface_override: None,
            fail_at: None,
            frames_allocated: Cell::new(0),
        }
    }

    /// Hold back `frames` decoded frames until more input arrives.
    pub fn with_decoder_delay(mut self, frames: usize) -> Self {
        self.delay = frames;
        self
    }

    /// Emit frames already in host memory (software fallback).
    pub fn with_host_output(mut self) -> Self {
        self.host_output = true;
        self
    }

    pub fn with_transfer_failure(mut self) -> Self {
        self.fail_transfer = true;
        self
    }

    /// Emit device frames in `format` instead of the negotiated surface format.
    pub fn with_surface_format(mut self, format: PixelFormat) -> Self {
        self.surface_override = Some(format);
        self
    }

    pub fn failing_at(mut self, point: FailPoint) -> Self {
        self.fail_at = Some(point);
        self
    }

    pub fn without_decoder(mut self, codec: CodecId) -> Self {
        self.missing_decoders.push(codec);
        self
    }

    /// Decoders advertise no hardware configurations at all.
    pub fn without_hw_configs(mut self) -> Self {
        self.hw_configs = false;
        self
    }

    pub fn ledger(&self) -> Ledger {
        self.ledger.clone()
    }

    fn check(&self, point: FailPoint) -> BackendResult<()> {
        if self.fail_at == Some(point) {
            Err(BackendError::new(format!("injected failure at {point:?}")))
        } else {
            Ok(())
        }
    }

    fn empty_frame(&self) -> MockFrame {
        MockFrame {
            width: 0,
            height: 0,
            format: PixelFormat::Other(-1),
            planes: Vec::new(),
            _guard: self.ledger.acquire(Resource::Frame),
        }
    }
}

fn nv12_planes(width: u32, height: u32) -> Vec<(Vec<u8>, usize)> {
    // rows padded to 32 bytes like real transfer output
    let stride = (width as usize).div_ceil(32) * 32;
    let rows = height as usize;
    let luma: Vec<u8> = (0..stride * rows)
        .map(|i| ((i / stride) % 251) as u8)
        .collect();
    let chroma = vec![128u8; stride * rows.div_ceil(2)];
    vec![(luma, stride), (chroma, stride)]
}

fn yuv420p_planes(width: u32, height: u32) -> Vec<(Vec<u8>, usize)> {
    let stride = width as usize;
    let rows = height as usize;
    let chroma_stride = stride.div_ceil(2);
    let luma: Vec<u8> = (0..stride * rows)
        .map(|i| ((i / stride) % 251) as u8)
        .collect();
    vec![
        (luma, stride),
        (vec![128u8; chroma_stride * rows.div_ceil(2)], chroma_stride),
        (vec![128u8; chroma_stride * rows.div_ceil(2)], chroma_stride),
    ]
}

impl DecodeBackend for MockBackend {
    type DeviceKind = MockDeviceKind;
    type Device = MockDevice;
    type Codec = MockCodec;
    type Parser = MockParser;
    type Frame = MockFrame;

    fn device_type_names(&self) -> Vec<String> {
        self.devices.iter().map(|d| d.name.to_string()).collect()
    }

    fn find_device_type(&self, name: &str) -> Option<MockDeviceKind> {
        self.devices
            .iter()
            .position(|d| d.name == name)
            .map(MockDeviceKind)
    }

    fn device_type_name(&self, kind: MockDeviceKind) -> String {
        self.devices
            .get(kind.0)
            .map(|d| d.name.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    fn find_decoder(&self, codec: CodecId) -> Option<DecoderInfo<MockDeviceKind>> {
        if self.missing_decoders.contains(&codec) {
            return None;
        }
        let hw_configs = if self.hw_configs {
            self.devices
                .iter()
                .enumerate()
                .map(|(i, d)| HwConfig {
                    device_ctx: true,
                    device: MockDeviceKind(i),
                    pixel_format: d.surface,
                })
                .collect()
        } else {
            Vec::new()
        };
        Some(DecoderInfo {
            name: codec.name().to_string(),
            codec,
            hw_configs,
        })
    }

    fn create_device(&self, kind: MockDeviceKind) -> BackendResult<MockDevice> {
        self.check(FailPoint::CreateDevice)?;
        Ok(MockDevice {
            kind,
            _guard: self.ledger.acquire(Resource::Device),
        })
    }

    fn open_codec(
        &self,
        _decoder: &DecoderInfo<MockDeviceKind>,
        device: &MockDevice,
        hw_format: PixelFormat,
    ) -> BackendResult<MockCodec> {
        self.check(FailPoint::OpenCodec)?;
        let offered = self.devices.get(device.kind.0).map(|d| d.surface);
        if offered != Some(hw_format) {
            return Err(BackendError::new(format!(
                "device does not offer {hw_format:?}"
            )));
        }
        Ok(MockCodec {
            hw_format,
            queue: VecDeque::new(),
            draining: false,
            _guard: self.ledger.acquire(Resource::Codec),
        })
    }

    fn create_parser(&self, _codec: CodecId) -> BackendResult<MockParser> {
        self.check(FailPoint::CreateParser)?;
        Ok(MockParser {
            buffer: Vec::new(),
            _guard: self.ledger.acquire(Resource::Parser),
        })
    }

    fn alloc_frame(&self) -> BackendResult<MockFrame> {
        let index = self.frames_allocated.get();
        self.frames_allocated.set(index + 1);
        self.check(FailPoint::AllocFrame(index))?;
        Ok(self.empty_frame())
    }

    fn parse(
        &self,
        parser: &mut MockParser,
        _codec: &mut MockCodec,
        data: &[u8],
        packet: &mut Vec<u8>,
    ) -> usize {
        packet.clear();
        if data.is_empty() {
            packet.append(&mut parser.buffer);
            return 0;
        }
        for (i, &byte) in data.iter().enumerate() {
            parser.buffer.push(byte);
            let len = parser.buffer.len();
            if len > START_CODE.len() && parser.buffer.ends_with(&START_CODE) {
                packet.extend_from_slice(&parser.buffer[..len - START_CODE.len()]);
                parser.buffer.clear();
                parser.buffer.extend_from_slice(&START_CODE);
                return i + 1;
            }
        }
        data.len()
    }

    fn send_packet(&self, codec: &mut MockCodec, packet: &[u8]) -> BackendResult<()> {
        if codec.draining {
            return Err(BackendError::new("End of file"));
        }
        if packet.len() < START_CODE.len() + 4 || !packet.starts_with(&START_CODE) {
            return Err(BackendError::new("Invalid data found when processing input"));
        }
        let width = u16::from_be_bytes([packet[4], packet[5]]) as u32;
        let height = u16::from_be_bytes([packet[6], packet[7]]) as u32;
        if width == 0 || height == 0 {
            return Err(BackendError::new("Invalid data found when processing input"));
        }
        codec.queue.push_back((width, height));
        Ok(())
    }

    fn send_eof(&self, codec: &mut MockCodec) -> BackendResult<()> {
        codec.draining = true;
        Ok(())
    }

    fn receive_frame(&self, codec: &mut MockCodec, frame: &mut MockFrame) -> BackendResult<Received> {
        let ready = codec.queue.len() > self.delay || (codec.draining && !codec.queue.is_empty());
        if !ready {
            return Ok(if codec.draining {
                Received::Eof
            } else {
                Received::Again
            });
        }
        let Some((width, height)) = codec.queue.pop_front() else {
            return Ok(Received::Again);
        };
        frame.width = width;
        frame.height = height;
        if self.host_output {
            frame.format = PixelFormat::Yuv420p;
            frame.planes = yuv420p_planes(width, height);
        } else {
            frame.format = self.surface_override.unwrap_or(codec.hw_format);
            frame.planes.clear();
        }
        Ok(Received::Frame)
    }

    fn frame_format(&self, frame: &MockFrame) -> PixelFormat {
        frame.format
    }

    fn transfer_to_host(&self, device_frame: &MockFrame, host_frame: &mut MockFrame) -> BackendResult<()> {
        if self.fail_transfer {
            return Err(BackendError::new("Input/output error"));
        }
        if !device_frame.format.is_hardware() {
            return Err(BackendError::new("frame is not device-resident"));
        }
        host_frame.width = device_frame.width;
        host_frame.height = device_frame.height;
        host_frame.format = PixelFormat::Nv12;
        host_frame.planes = nv12_planes(device_frame.width, device_frame.height);
        Ok(())
    }

    fn release_frame(&self, frame: &mut MockFrame) {
        frame.width = 0;
        frame.height = 0;
        frame.format = PixelFormat::Other(-1);
        frame.planes.clear();
    }

    fn frame_view<'f>(&self, frame: &'f MockFrame) -> DecodedFrame<'f> {
        let planes: Vec<(&[u8], usize)> = frame
            .planes
            .iter()
            .map(|(data, stride)| (&data[..], *stride))
            .collect();
        DecodedFrame::new(frame.width, frame.height, frame.format, &planes)
    }
}

impl ScaleBackend for MockBackend {
    type Scaler = MockScaler;

    fn create_scaler(&self, key: &ScalerKey, _algorithm: ScalingAlgorithm) -> BackendResult<MockScaler> {
        self.check(FailPoint::CreateScaler)?;
        if key.width == 0 || key.height == 0 || key.source.is_hardware() {
            return Err(BackendError::new("unsupported conversion"));
        }
        Ok(MockScaler {
            key: *key,
            _guard: self.ledger.acquire(Resource::Scaler),
        })
    }

    /// Writes a gray pixel per source luma sample.
    fn scale(
        &self,
        scaler: &mut MockScaler,
        source: &DecodedFrame<'_>,
        output: &mut [u8],
        layout: &ImageLayout,
    ) -> BackendResult<()> {
        let key = &scaler.key;
        if (source.width, source.height, source.format) != (key.width, key.height, key.source) {
            return Err(BackendError::new("frame does not match conversion context"));
        }
        source.check_planes()?;
        if *layout != self.image_layout(key.destination, key.width, key.height)? {
            return Err(BackendError::new("layout does not match conversion context"));
        }
        if output.len() < layout.size {
            return Err(BackendError::new("output buffer too small"));
        }
        let luma = source.plane(0);
        let luma_stride = source.stride(0);
        let width = key.width as usize;
        for y in 0..key.height as usize {
            let src = luma
                .get(y * luma_stride..y * luma_stride + width)
                .ok_or_else(|| BackendError::new("source plane too small"))?;
            let row = &mut output[y * layout.stride..y * layout.stride + width * 3];
            for (px, &value) in row.chunks_exact_mut(3).zip(src) {
                px.fill(value);
            }
        }
        Ok(())
    }
}
