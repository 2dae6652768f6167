use super::*;

use pretty_assertions::assert_eq;

fn parse_str(s: &str) -> Result<FormSelection> {
    parse(&FormParam::from(s))
}

#[test]
fn aliases_match_codes() {
    let groups: &[(i64, &[&str])] = &[
        (0, &["", "0", "false", "FALSE", "null", "  Null "]),
        (1, &["none", "NONE", "1", "ignore", "validate", "validate-only", "Validate_Only"]),
        (2, &["d", "D", "nfd", "NFD", "form_d", "FORM-D", "nf-d", "decompose", "collation", "2"]),
        (3, &["kd", "KD", "nfkd", "NFKD", "form_kd", "3"]),
        (
            4,
            &["c", "C", "nfc", "form_c", "compose", "recompose", "Legacy", "HTML5", "4"],
        ),
        (5, &["kc", "nfkc", "NFKC", "form_kc", "matching", "5"]),
        (6, &["mac", "MAC", "d-mac", "d_mac", "nfd_mac", "NFD-MAC", "nfdmac", "6"]),
    ];

    for (code, aliases) in groups {
        let want = parse(&FormParam::Int(*code)).unwrap();
        for alias in *aliases {
            assert_eq!(parse_str(alias), Ok(want), "alias {alias:?}");
        }
    }
}

#[test]
fn integer_codes() {
    assert_eq!(parse(&FormParam::Int(0)), Ok(FormSelection::Disabled));
    for form in Form::ALL {
        assert_eq!(
            parse(&FormParam::Int(form.code().into())),
            Ok(FormSelection::Form(form))
        );
    }
    assert_eq!(parse(&FormParam::from(2i64)), Ok(FormSelection::Form(Form::Nfd)));
}

#[test]
fn unknown_identifiers() {
    assert_eq!(
        parse(&FormParam::Int(7)),
        Err(Error::InvalidForm("7".into()))
    );
    assert_eq!(
        parse(&FormParam::Int(-1)),
        Err(Error::InvalidForm("-1".into()))
    );
    for bad in ["nf", "form", "x", "nfx", "decomposed", "k", "mac-d", "7"] {
        assert_eq!(parse_str(bad), Err(Error::InvalidForm(bad.into())), "{bad:?}");
    }
}

#[test]
fn from_str_and_display() {
    use std::assert_eq;

    for form in Form::ALL {
        assert_eq!(form.to_string().parse::<Form>(), Ok(form));
    }
    assert_eq!("NFD_MAC".parse::<Form>(), Ok(Form::NfdMac));
    assert_eq!("html5".parse::<Form>(), Ok(Form::Nfc));
    assert_eq!("false".parse::<Form>(), Err(Error::InvalidForm("false".into())));
    assert_eq!(Form::try_from(3), Ok(Form::Nfkd));
    assert_eq!(Form::try_from(0), Err(Error::InvalidForm("0".into())));
}

#[test]
fn disabled_is_pass_through() {
    assert_eq!(FormSelection::Disabled.effective(), Form::None);
    assert_eq!(FormSelection::Form(Form::Nfkc).effective(), Form::Nfkc);
}

#[cfg(feature = "serde")]
#[test]
fn deserialize_from_config() {
    #[derive(serde::Deserialize)]
    struct Config {
        form: Form,
    }

    let by_name: Config = serde_json::from_str(r#"{"form": "nfkc"}"#).unwrap();
    assert_eq!(by_name.form, Form::Nfkc);
    let by_code: Config = serde_json::from_str(r#"{"form": 6}"#).unwrap();
    assert_eq!(by_code.form, Form::NfdMac);
    assert!(serde_json::from_str::<Config>(r#"{"form": "nope"}"#).is_err());
    assert_eq!(serde_json::to_string(&Form::NfdMac).unwrap(), r#""NFD_MAC""#);
}
