//! Drives the external codec contract through shell scripts.
#![cfg(unix)]

mod common;

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use common::{config, write_translated_cube_dataset};
use tempfile::tempdir;
use tvmc_tools::{Codec, CodecError, EncodeSettings, ExternalCodec, Pipeline, PipelineError, Stage};

const COPY_ARGS: &str = r#"while [ $# -gt 0 ]; do
  case "$1" in
    -i) input="$2"; shift 2 ;;
    -o) output="$2"; shift 2 ;;
    *) shift ;;
  esac
done
cp "$input" "$output"
"#;

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[test]
fn external_codec_contract() {
    let dir = tempdir().unwrap();
    let encoder = script(
        dir.path(),
        "encoder.sh",
        &format!("{COPY_ARGS}echo \"Encoded in 17 ms to encode.\"\n"),
    );
    let decoder = script(
        dir.path(),
        "decoder.sh",
        &format!("{COPY_ARGS}echo \"Decoded in 9 ms to decode.\"\n"),
    );
    let silent = script(dir.path(), "silent.sh", COPY_ARGS);
    let failing = script(dir.path(), "failing.sh", "echo boom >&2\nexit 3\n");

    // timing text is parsed from stdout
    let codec = ExternalCodec::new(&encoder, &decoder);
    let input = dir.path().join("in.ply");
    fs::write(&input, "payload").unwrap();
    let encoded = dir.path().join("out.drc");
    let run = codec.encode(&input, &encoded, &EncodeSettings::displacement(8)).unwrap();
    assert_eq!(run.elapsed_ms, Some(17));
    assert_eq!(fs::read_to_string(&encoded).unwrap(), "payload");
    let run = codec.decode(&encoded, &dir.path().join("back.ply")).unwrap();
    assert_eq!(run.elapsed_ms, Some(9));

    // missing timing text is tolerated
    let quiet = ExternalCodec::new(&silent, &silent);
    let run = quiet.encode(&input, &dir.path().join("quiet.drc"), &EncodeSettings::REFERENCE_MESH).unwrap();
    assert_eq!(run.elapsed_ms, None);

    // a non-zero exit is a hard failure carrying stderr
    let broken = ExternalCodec::new(&failing, &failing);
    match broken.decode(&encoded, &dir.path().join("never.ply")) {
        Err(CodecError::Exit { stderr, .. }) => assert_eq!(stderr, "boom"),
        other => panic!("expected exit failure, got {other:?}"),
    }

    // full run through real processes
    let workspace = dir.path().join("ws");
    let mut run_config = config(&workspace);
    run_config.encoder_path = encoder.clone();
    run_config.decoder_path = decoder.clone();
    write_translated_cube_dataset(&run_config);
    let summary = Pipeline::new(&run_config, ExternalCodec::new(&encoder, &decoder))
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(summary.timing.mean_encode_ms, Some(17.0));
    assert_eq!(summary.timing.mean_decode_ms, Some(9.0));
    assert_eq!(summary.timing.reference_decode_ms, Some(9));
    assert!(summary.timing.decode_time_ms >= 18.0);

    // a failing decoder stops the run at the reference decode
    let err = Pipeline::new(&run_config, ExternalCodec::new(&encoder, &failing))
        .unwrap()
        .run()
        .unwrap_err();
    assert_eq!(err.stage(), Some(Stage::DecodeReference));
    assert!(matches!(err, PipelineError::Codec { .. }));
}
