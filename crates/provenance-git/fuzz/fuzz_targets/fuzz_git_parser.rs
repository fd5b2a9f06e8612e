// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

#![no_main]

use libfuzzer_sys::fuzz_target;
use provenance_git::process::{parse_log_records, parse_raw_date, parse_tag_records, parse_tag_stubs};

fuzz_target!(|data: &[u8]| {
    let Ok(output) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(commits) = parse_log_records(output) {
        for commit in commits {
            assert_eq!(commit.id.len(), 40);
            let _ = commit.subject();
        }
    }
    let _ = parse_tag_stubs(output);
    let _ = parse_tag_records(output);
    let _ = parse_raw_date(output);
});
