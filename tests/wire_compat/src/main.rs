fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use imagine_protocol::constants::MessageType;
    use imagine_protocol::envelope::Message;
    use imagine_protocol::messages::{
        ConnectRequest, ImagineRequest, JobResult, ProgressNotice, ReadyResponse, UpscaleRequest,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn read_fixture(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// Parses a fixture as an envelope, re-serializes it, and compares the
    /// JSON values (key order independent).
    fn roundtrip_envelope(name: &str) -> Message {
        let data = read_fixture(name);
        let expected: serde_json::Value = serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"));
        let msg: Message = serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&msg)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));
        assert_eq!(
            expected, reserialized,
            "roundtrip mismatch for {name}:\n  fixture: {expected}\n  rust:    {reserialized}"
        );
        msg
    }

    /// Checks that the typed payload re-serializes to the fixture's payload.
    fn roundtrip_payload<T>(msg: &Message) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let raw = msg.payload.as_ref().expect("fixture has a payload");
        let typed: T = msg
            .parse_payload()
            .unwrap_or_else(|e| panic!("payload of {:?} does not parse: {e}", msg.msg_type))
            .expect("payload is not null");
        let expected: serde_json::Value = serde_json::from_str(raw.get()).unwrap();
        assert_eq!(serde_json::to_value(&typed).unwrap(), expected);
        typed
    }

    #[test]
    fn fixture_connect() {
        let msg = roundtrip_envelope("connect.json");
        assert_eq!(msg.msg_type, MessageType::Connect);
        let req: ConnectRequest = roundtrip_payload(&msg);
        assert_eq!(req.client_name, "studio-workstation");
    }

    #[test]
    fn fixture_ready() {
        let msg = roundtrip_envelope("ready.json");
        let ready: ReadyResponse = roundtrip_payload(&msg);
        assert_eq!(ready.session_id, "b6f2a9d4c1e8");
    }

    #[test]
    fn fixture_imagine() {
        let msg = roundtrip_envelope("imagine.json");
        let req: ImagineRequest = roundtrip_payload(&msg);
        assert!(req.prompt.starts_with("a red fox"));
    }

    #[test]
    fn fixture_progress_shares_request_id() {
        let imagine = roundtrip_envelope("imagine.json");
        let msg = roundtrip_envelope("progress.json");
        assert_eq!(msg.msg_type, MessageType::Progress);
        assert_eq!(msg.id, imagine.id);
        let notice: ProgressNotice = roundtrip_payload(&msg);
        assert_eq!(notice.progress, "46%");
    }

    #[test]
    fn fixture_job_result() {
        let msg = roundtrip_envelope("job_result.json");
        let result: JobResult = roundtrip_payload(&msg);
        assert_eq!(result.id, "1123581321345589144");
        assert_eq!(result.flags, 0);
    }

    #[test]
    fn fixture_job_result_without_payload_is_empty() {
        let msg = roundtrip_envelope("job_result_empty.json");
        assert_eq!(msg.msg_type, MessageType::JobResult);
        assert!(msg.parse_payload::<JobResult>().unwrap().is_none());
    }

    #[test]
    fn fixture_upscale_references_generated_job() {
        let generated: JobResult = roundtrip_payload(&roundtrip_envelope("job_result.json"));
        let msg = roundtrip_envelope("upscale.json");
        let req: UpscaleRequest = roundtrip_payload(&msg);
        assert_eq!(req.index, 1);
        assert_eq!(req.msg_id, generated.id);
        assert_eq!(req.hash, generated.hash);
        assert_eq!(req.flags, generated.flags);
    }

    #[test]
    fn fixture_error() {
        let msg = roundtrip_envelope("error.json");
        assert_eq!(msg.msg_type, MessageType::Error);
        assert!(msg.payload.is_none());
        let err = msg.error.expect("error details");
        assert_eq!(err.code, 503);
        assert_eq!(err.message, "job queue is full");
    }
}
