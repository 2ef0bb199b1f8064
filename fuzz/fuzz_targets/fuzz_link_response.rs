//! Fuzz target: modem response parsing
//!
//! Feeds arbitrary text through the prefixed scanner, the tokenizer, and
//! the link-status field mapping.  None of them may panic, and every field
//! must stay within its wire width.
//!
//! cargo fuzz run fuzz_link_response

#![no_main]

use libfuzzer_sys::fuzz_target;
use waterlevel::link::LinkStatus;
use waterlevel::link::registration::parse_cereg_urc;
use waterlevel::link::response::{Charset, MAX_FIELDS, MAX_PAYLOAD_CHARS, scan_prefixed, tokenize};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };

    assert!(tokenize(text).len() <= MAX_FIELDS);
    let _ = parse_cereg_urc(text);

    for (prefix, charset) in [
        ("%XMONITOR: ", Charset::Field),
        ("+CCLK: \"", Charset::Clock),
        ("%XICCID: ", Charset::Digits),
        ("+COPS: ", Charset::Operator),
    ] {
        if let Some(found) = scan_prefixed(text, prefix, charset, MAX_PAYLOAD_CHARS) {
            assert!(found.chars().count() <= MAX_PAYLOAD_CHARS);
        }
    }

    let mut status = LinkStatus::default();
    status.apply_monitor(text);
    status.apply_coneval(text);
    assert!(status.plmn.len() <= 7);
    assert!(status.cell_id.len() <= 10);
    assert!(status.rsrp.len() <= 3);
});
