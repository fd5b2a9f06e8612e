// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

#![no_main]

use libfuzzer_sys::fuzz_target;
use provenance_git::MailMap;

fuzz_target!(|data: &[u8]| {
    let content = String::from_utf8_lossy(data);
    let map = MailMap::parse(&content);
    let _ = map.canonical_name("Name", "name@example.com");
    let _ = map.canonical_email("Name", "name@example.com");
});
