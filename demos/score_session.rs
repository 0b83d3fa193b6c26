//! Score a sample session for validation testing

fn main() {
    let json = r#"{
        "gameType": "Reaction Test",
        "raw_events": [
            { "trial": 0, "latency_ms": 342 },
            { "trial": 1, "latency_ms": 287 },
            { "trial": 2, "latency_ms": 301 },
            { "trial": 3, "latency_ms": 295 },
            { "trial": 4, "latency_ms": 980 }
        ],
        "false_starts": 1,
        "input": "mouse+keyboard"
    }"#;

    match playwell_engine::score_session_json(json) {
        Ok(outcome) => print!("{outcome}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
