use super::*;
use crate::UnicodeEngine;
use crate::boundary::MAX_DEFERRED_BYTES;

// The tests in this file drive `FilterSession` the way a stream host would.
// The byte-level scanning rules have their own tests under
// `crate::boundary::tests`.

use pretty_assertions::assert_eq;

fn session(form: Form) -> FilterSession {
    FilterSession::new(form, Arc::new(UnicodeEngine), Capability::detect()).unwrap()
}

/// Feeds `chunks` through `session`, carrying the unconsumed remainder of
/// each call over into the next, then finishes the stream.
fn run(session: &mut FilterSession, chunks: &[&[u8]]) -> Result<Vec<u8>> {
    let mut pending = Vec::new();
    let mut out = Vec::new();
    for chunk in chunks {
        pending.extend_from_slice(chunk);
        if pending.is_empty() {
            continue;
        }
        let filtered = session.filter(&pending)?;
        out.extend_from_slice(&filtered.output);
        pending.drain(..filtered.consumed);
    }
    out.extend(session.finish(&pending)?);
    Ok(out)
}

const SAMPLES: &[&str] = &[
    "déjà vu",
    "de\u{301}ja\u{300} vu",
    "Åström ﬁ ① ㍿ 𝄞",
    "한국어 \u{1100}\u{1161}\u{11A8}",
    "e\u{323}\u{301} o\u{301}\u{323}\u{31B}",
    "\u{0F73}\u{0F71}\u{0F72} ‥ \u{F900}",
    "plain ASCII text",
];

const STANDARD_FORMS: [Form; 5] = [Form::None, Form::Nfd, Form::Nfkd, Form::Nfc, Form::Nfkc];

#[test]
fn splitting_into_two_chunks_never_changes_the_result() {
    let engine = UnicodeEngine;
    for form in STANDARD_FORMS {
        for sample in SAMPLES {
            let bytes = sample.as_bytes();
            let want = engine.normalize(bytes, form).unwrap();
            for split in 0..=bytes.len() {
                let got = run(&mut session(form), &[&bytes[..split], &bytes[split..]]).unwrap();
                assert_eq!(got, want, "{form} {sample:?} split at {split}");
            }
        }
    }
}

#[test]
fn long_runs_split_anywhere() {
    let engine = UnicodeEngine;
    let samples = [
        "ｶﾞ".repeat(30),
        "Ａ\u{301}".repeat(30),
        format!("{}\u{11A8}", "\u{1100}\u{1161}".repeat(25)),
        format!("\u{1100}{}\u{11A8}", "\u{1161}".repeat(50)),
    ];
    for form in STANDARD_FORMS {
        for sample in &samples {
            let bytes = sample.as_bytes();
            assert!(bytes.len() > MAX_DEFERRED_BYTES);
            let want = engine.normalize(bytes, form).unwrap();
            for split in 0..=bytes.len() {
                let got = run(&mut session(form), &[&bytes[..split], &bytes[split..]]).unwrap();
                assert_eq!(got, want, "{form} {sample:?} split at {split}");
            }
        }
    }
}

#[test]
fn halfwidth_voiced_mark_in_a_later_chunk() {
    let bytes = "ｶﾞ".repeat(30).into_bytes();
    let (first, second) = bytes.split_at(147);
    let got = run(&mut session(Form::Nfkc), &[first, second]).unwrap();
    assert_eq!(String::from_utf8(got).unwrap(), "ガ".repeat(30));
}

#[test]
fn splitting_into_three_chunks_never_changes_the_result() {
    let engine = UnicodeEngine;
    let bytes = "ẹ́ 𝄞 ﬁ".as_bytes();
    for form in [Form::Nfd, Form::Nfc, Form::Nfkc] {
        let want = engine.normalize(bytes, form).unwrap();
        for a in 0..=bytes.len() {
            for b in a..=bytes.len() {
                let chunks: [&[u8]; 3] = [&bytes[..a], &bytes[a..b], &bytes[b..]];
                let got = run(&mut session(form), &chunks).unwrap();
                assert_eq!(got, want, "{form} split at {a} and {b}");
            }
        }
    }
}

#[test]
fn one_codepoint_per_chunk() {
    use ::u8char::AsU8Chars;

    let input = "Ame\u{301}lie ha\u{308}tte gern 🧑‍🌾";
    let chars: Vec<_> = input.u8chars().collect();
    let chunks: Vec<&[u8]> = chars.iter().map(|c| c.as_str().as_bytes()).collect();
    for form in STANDARD_FORMS {
        let want = UnicodeEngine.normalize(input.as_bytes(), form).unwrap();
        assert_eq!(run(&mut session(form), &chunks).unwrap(), want, "{form}");
    }
}

#[test]
fn deja_split_inside_combining_mark() {
    let mut session = session(Form::Nfc);

    let first = session.filter(&[0x64, 0x65, 0xCC]).unwrap();
    // "e" waits for whatever the next chunk begins with.
    assert_eq!(
        first,
        Filtered {
            output: vec![0x64],
            consumed: 1
        }
    );

    let second = session
        .filter(&[0x65, 0xCC, 0x81, 0x6A, 0x61, 0xCC, 0x80])
        .unwrap();
    assert_eq!(
        second,
        Filtered {
            output: vec![0xC3, 0xA9, 0x6A],
            consumed: 4
        }
    );

    let last = session.finish(&[0x61, 0xCC, 0x80]).unwrap();
    assert_eq!(last, vec![0xC3, 0xA0]);
    assert_eq!(session.state(), State::Closed);
}

#[test]
fn deja_end_to_end() {
    let got = run(
        &mut session(Form::Nfc),
        &[&[0x64, 0x65, 0xCC], &[0x81, 0x6A, 0x61, 0xCC, 0x80]],
    )
    .unwrap();
    assert_eq!(got, vec![0x64, 0xC3, 0xA9, 0x6A, 0xC3, 0xA0]);
}

#[test]
fn pass_through_for_none() {
    let mut session = session(Form::None);
    // Not UTF-8 at all.
    let junk = [0x80, 0xFF, b'a', 0xC3];
    assert_eq!(
        session.filter(&junk).unwrap(),
        Filtered {
            output: junk.to_vec(),
            consumed: junk.len()
        }
    );
    assert_eq!(session.finish(&[]).unwrap(), Vec::<u8>::new());
}

#[test]
fn empty_chunk_is_fatal() {
    let mut session = session(Form::Nfc);
    assert_eq!(session.filter(&[]), Err(Error::EmptyChunk));
    assert_eq!(session.state(), State::Closed);
    assert_eq!(session.filter(b"a"), Err(Error::Closed));
}

#[test]
fn malformed_input_is_fatal() {
    let mut s = session(Form::Nfd);
    assert_eq!(
        s.filter(&[0x80, b'a']),
        Err(Error::MalformedInput {
            offset: 0,
            byte: 0x80
        })
    );
    assert_eq!(s.filter(b"a"), Err(Error::Closed));

    let mut s = session(Form::Nfd);
    assert_eq!(
        s.filter(&[b'a', 0x80, 0x80, 0x80, 0x80]),
        Err(Error::MalformedInput {
            offset: 1,
            byte: 0x80
        })
    );

    // Bad bytes in the middle of an otherwise well-aligned chunk.
    let mut s = session(Form::Nfc);
    assert_eq!(
        s.filter(b"ab\xC3(cd"),
        Err(Error::MalformedInput {
            offset: 2,
            byte: 0xC3
        })
    );
}

#[test]
fn reserved_byte_is_rejected() {
    let mut s = session(Form::Nfc);
    assert_eq!(
        s.filter(b"ab\xFF"),
        Err(Error::MalformedInput {
            offset: 2,
            byte: 0xFF
        })
    );
    assert!(matches!(
        UnicodeEngine.normalize(b"ab\xFF", Form::Nfc),
        Err(Error::EngineFailure(_))
    ));
}

#[test]
fn end_of_input_mid_codepoint() {
    let mut s = session(Form::Nfc);
    let filtered = s.filter(&[b'a', 0xE2, 0x82]).unwrap();
    // Both the split "€" and the "a" before it are held back.
    assert_eq!(filtered.consumed, 0);
    assert_eq!(
        s.finish(&[b'a', 0xE2, 0x82]),
        Err(Error::EndOfInputMidCodepoint { pending: 2 })
    );
    assert_eq!(s.finish(&[]), Err(Error::Closed));
}

#[test]
fn finish_without_remainder() {
    let mut s = session(Form::Nfkc);
    assert_eq!(s.finish(&[]).unwrap(), Vec::<u8>::new());
    assert_eq!(s.state(), State::Closed);
}

#[test]
fn nfd_mac_requires_capability() {
    let err = FilterSession::new(
        Form::NfdMac,
        Arc::new(UnicodeEngine),
        Capability::standard_only(),
    )
    .unwrap_err();
    assert_eq!(err, Error::UnsupportedVariant);
}

#[test]
fn nfd_mac_ascii_needs_no_host_support() {
    let mut s = FilterSession::new(
        Form::NfdMac,
        Arc::new(UnicodeEngine),
        Capability::assume_nfd_mac(),
    )
    .unwrap();
    assert_eq!(run(&mut s, &[b"read", b"me.txt"]).unwrap(), b"readme.txt");
}

#[test]
fn nfd_mac_chunked() {
    use crate::capability::{PROBE_COMPOSED, PROBE_MAC};

    if !Capability::detect().nfd_mac_available() {
        return;
    }
    for split in 0..=PROBE_COMPOSED.len() {
        let got = run(
            &mut session(Form::NfdMac),
            &[&PROBE_COMPOSED[..split], &PROBE_COMPOSED[split..]],
        )
        .unwrap();
        assert_eq!(got, PROBE_MAC, "split at {split}");
    }
}
