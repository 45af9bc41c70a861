use plain::Plain;

/// 内核侧通过 ring buffer 上报的数据包事件
///
/// Layout matches the kernel-side struct. Nothing in this crate reads these
/// from the kernel yet.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PacketEvent {
    pub src_ip: u32,
    pub dst_ip: u32,
    pub src_port: u16,
    pub dst_port: u16,
    pub protocol: u8,
    pub length: u32,
}

unsafe impl Plain for PacketEvent {}
