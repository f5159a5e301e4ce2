// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn event_wire_format_is_camel_case() -> anyhow::Result<()> {
    let json = serde_json::json!({
        "author": "assistant",
        "content": { "role": "model", "parts": [
            { "functionCall": { "id": "fc-1", "name": "lookup", "args": { "q": 1 } } }
        ]},
        "longRunningToolIds": ["fc-1"]
    });
    let event: Event = serde_json::from_value(json.clone())?;
    assert!(event.long_running_tool_ids.contains("fc-1"));
    let call = event.parts()[0].function_call.as_ref().ok_or_else(|| anyhow::anyhow!("no call"))?;
    assert_eq!(call.name, "lookup");
    assert_eq!(serde_json::to_value(&event)?, json);
    Ok(())
}

#[test]
fn texts_skips_non_text_parts() -> anyhow::Result<()> {
    let event = Event::new(
        None,
        Content::new(
            Role::Model,
            vec![
                Part::text("a"),
                Part::function_call(FunctionCall {
                    id: None,
                    name: "f".into(),
                    args: Default::default(),
                }),
                Part::text("b"),
            ],
        ),
    );
    assert_eq!(event.texts().collect::<Vec<_>>(), vec!["a", "b"]);
    Ok(())
}

#[test]
fn empty_event_has_no_parts() -> anyhow::Result<()> {
    let event = Event::default();
    assert!(event.parts().is_empty());
    assert_eq!(event.texts().count(), 0);
    Ok(())
}
