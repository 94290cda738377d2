use wxf::prelude::*;

fn doc(body: &[u8]) -> Vec<u8> {
    let mut bytes = vec![b'8', b':'];
    bytes.extend_from_slice(body);
    bytes
}

#[test]
fn header_is_required() {
    for bytes in [&b""[..], &b"8"[..], &b"9:"[..], &b":8\x43\x01"[..]] {
        let mut decoder = Decoder::new(bytes);
        assert_eq!(decoder.parse(), Err(Error::InvalidMagic));
        assert!(decoder.tokens().is_empty());
    }
}

#[test]
fn header_only_document_has_no_tokens() {
    assert!(tokenize(b"8:").unwrap().is_empty());
    assert_eq!(ExprTree::parse(b"8:").unwrap_err(), Error::EmptyStream);
}

#[test]
fn unknown_tag_keeps_earlier_tokens() {
    // f[1, <tag 0x01> ...]
    let bytes = doc(&[102, 2, 115, 1, b'f', 67, 1, 0x01, 67, 2]);
    let mut decoder = Decoder::new(&bytes);
    assert_eq!(
        decoder.parse(),
        Err(Error::UnknownTag {
            tag: 0x01,
            position: 9
        })
    );
    assert_eq!(decoder.tokens().len(), 3);
    assert_eq!(decoder.tokens()[2].integer().unwrap(), 1);
}

#[test]
fn failed_parse_does_not_resume_past_the_faulty_element() {
    // f[1, <tag 0x01>, 2]
    let bytes = doc(&[102, 2, 115, 1, b'f', 67, 1, 0x01, 67, 2]);
    let mut decoder = Decoder::new(&bytes);
    let first = decoder.parse().unwrap_err();
    assert_eq!(decoder.position(), 9);
    assert_eq!(decoder.parse(), Err(first));
    assert_eq!(decoder.position(), 9);
    assert_eq!(decoder.tokens().len(), 3);
    assert!(!decoder.is_complete());

    // A 9-byte string whose payload holds what looks like an Integer8 element.
    let bytes = doc(&[83, 9, 67, 1]);
    let mut decoder = Decoder::new(&bytes);
    assert!(decoder.parse().unwrap_err().is_unexpected_end());
    assert_eq!(decoder.position(), 2);
    assert!(decoder.parse().unwrap_err().is_unexpected_end());
    assert!(decoder.tokens().is_empty());
}

#[test]
fn truncated_varint_is_an_error() {
    // String whose length varint never terminates.
    let bytes = doc(&[83, 0x80, 0x80]);
    assert_eq!(
        tokenize(&bytes).unwrap_err(),
        Error::InvalidVarint { position: 3 }
    );
}

#[test]
fn overlong_varint_is_an_error() {
    let mut body = vec![102];
    body.extend_from_slice(&[0xff; 10]);
    body.push(0x01);
    assert!(tokenize(&doc(&body)).unwrap_err().is_invalid_varint());
}

#[test]
fn payload_past_end_is_an_error() {
    let bytes = doc(&[83, 5, b'a', b'b']);
    assert_eq!(
        tokenize(&bytes).unwrap_err(),
        Error::UnexpectedEnd {
            position: 4,
            needed: 3
        }
    );
    assert!(tokenize(&doc(&[76, 1, 2, 3])).unwrap_err().is_unexpected_end());
}

#[test]
fn array_subtypes_are_checked() {
    // Unknown subtype code.
    let bytes = doc(&[194, 7, 1, 1, 0]);
    assert_eq!(
        tokenize(&bytes).unwrap_err(),
        Error::InvalidArrayElementType {
            code: 7,
            position: 3
        }
    );
    // Unsigned subtype in a packed array.
    let bytes = doc(&[193, 16, 1, 1, 0]);
    assert!(
        tokenize(&bytes)
            .unwrap_err()
            .is_invalid_array_element_type()
    );
    // Same subtype is fine in a numeric array.
    let bytes = doc(&[194, 16, 1, 1, 9]);
    let tokens = tokenize(&bytes).unwrap();
    assert_eq!(tokens[0].to_vec::<u8>().unwrap(), [9]);
}

#[test]
fn oversized_dimensions_are_rejected() {
    let mut body = vec![194, 3, 2];
    let huge = u64::MAX >> 1;
    for _ in 0..2 {
        wxf::encoding::varint::encode_u64(huge, &mut |b: &[u8]| body.extend_from_slice(b));
    }
    assert!(tokenize(&doc(&body)).unwrap_err().is_array_too_large());
}

#[test]
fn rank_zero_array_holds_one_element() {
    let mut body = vec![193, 2, 0];
    body.extend_from_slice(&5i32.to_ne_bytes());
    let bytes = doc(&body);
    let tokens = tokenize(&bytes).unwrap();
    assert_eq!(tokens[0].rank(), 0);
    assert_eq!(tokens[0].count(), 1);
    assert_eq!(tokens[0].to_vec::<i32>().unwrap(), [5]);
}

#[test]
fn huge_declared_arity_is_incomplete_not_fatal() {
    let mut body = vec![102];
    wxf::encoding::varint::encode_u64(u32::MAX as u64, &mut |b: &[u8]| body.extend_from_slice(b));
    body.extend_from_slice(&[115, 1, b'f', 67, 1]);
    assert_eq!(
        ExprTree::parse(&doc(&body)).unwrap_err(),
        Error::IncompleteTree { open_frames: 1 }
    );
}

#[test]
fn trailing_tokens_after_root() {
    let bytes = doc(&[67, 1, 67, 2]);
    assert_eq!(
        ExprTree::parse(&bytes).unwrap_err(),
        Error::TrailingTokens { position: 1 }
    );
}

#[test]
fn token_limit() {
    let bytes = doc(&[102, 3, 115, 1, b'f', 67, 1, 67, 2, 67, 3]);
    let limits = DecodeLimits::default().with_max_tokens(4);
    assert_eq!(
        ExprTree::parse_with_limits(&bytes, limits).unwrap_err(),
        Error::TokenLimitExceeded { limit: 4 }
    );
    let limits = DecodeLimits::default().with_max_tokens(5);
    assert!(ExprTree::parse_with_limits(&bytes, limits).is_ok());
}

#[test]
fn invalid_utf8_is_reported_by_accessors() {
    let bytes = doc(&[83, 2, 0xc3, 0x28]);
    let tokens = tokenize(&bytes).unwrap();
    assert_eq!(tokens[0].text(), Err(Error::InvalidUtf8 { position: 2 }));
    assert_eq!(
        Expr::from_wxf(&bytes).unwrap_err(),
        Error::InvalidUtf8 { position: 2 }
    );
}

#[test]
fn accessors_check_the_token_kind() {
    let bytes = doc(&[83, 1, b'x']);
    let tokens = tokenize(&bytes).unwrap();
    assert_eq!(
        tokens[0].integer(),
        Err(Error::UnexpectedToken {
            expected: "integer",
            found: ElementTag::String
        })
    );
    assert!(tokens[0].real().is_err());
    assert_eq!(tokens[0].symbol(), None);
}
