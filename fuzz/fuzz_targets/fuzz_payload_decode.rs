//! Fuzz target: verdict payload decoding with arbitrary layouts.

#![no_main]

use libfuzzer_sys::fuzz_target;
use surfscan::codec::VerdictEncoder;
use surfscan::config::ByteOrder;

fuzz_target!(|data: &[u8]| {
    let Some((&head, buf)) = data.split_first() else { return };
    let a = u16::from(head & 0x0F);
    let b = u16::from(head >> 4);
    let order = if head & 1 == 0 { ByteOrder::Little } else { ByteOrder::Big };
    let Ok(layout) = VerdictEncoder::new(a, b, order) else { return };
    if let Ok(v) = layout.decode(buf) {
        assert_eq!(layout.decode(layout.encode(&v).as_bytes()), Ok(v));
    }
});
