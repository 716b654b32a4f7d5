//! Literal wire-format fixtures: every payload kind serialized against the
//! exact JSON a conforming peer produces.

use acpkit_protocol::*;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn initialize_exchange() {
    let request: InitializeRequest = serde_json::from_value(json!({
        "protocolVersion": 1,
        "clientInfo": {"name": "E", "version": "1.0"},
        "capabilities": {"fs": {"read": true, "write": true}}
    }))
    .unwrap();
    assert_eq!(request.protocol_version, 1);
    assert!(request.capabilities.can_read_files());

    let response = InitializeResponse {
        protocol_version: 1,
        agent_info: Implementation::new("A", "0.1.0"),
        capabilities: AgentCapabilities {
            load_session: true,
            ..Default::default()
        },
        auth_methods: Vec::new(),
        meta: None,
    };
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({
            "protocolVersion": 1,
            "agentInfo": {"name": "A", "version": "0.1.0"},
            "capabilities": {"loadSession": true}
        })
    );
}

#[test]
fn method_not_found_error_object() {
    let error = AcpError::method_not_found("no/such");
    assert_eq!(
        serde_json::to_value(error.to_wire()).unwrap(),
        json!({
            "code": -32601,
            "message": "Method not found: no/such",
            "data": {"method": "no/such"}
        })
    );
}

#[test]
fn agent_message_chunk_update() {
    let notification = SessionNotification::new(
        SessionId::from("S"),
        SessionUpdate::AgentMessageChunk(MessageChunk {
            content: "Echo: hi".to_string(),
            index: 0,
            is_final: None,
        }),
    );
    assert_eq!(
        serde_json::to_value(&notification).unwrap(),
        json!({
            "sessionId": "S",
            "type": "agent_message_chunk",
            "data": {"content": "Echo: hi", "index": 0}
        })
    );
}

#[test]
fn tool_call_then_updates() {
    let full = SessionUpdate::ToolCall(ToolCall {
        id: ToolCallId::from("tc_1"),
        name: "write_file".to_string(),
        input: serde_json::from_value(json!({"path": "/p", "content": "x"})).unwrap(),
        status: ToolCallStatus::AwaitingPermission,
        kind: Some(ToolKind::Edit),
        location: None,
        reason: None,
        output: None,
        error: None,
        duration: None,
        requires_permission: true,
    });
    assert_eq!(
        serde_json::to_value(&full).unwrap(),
        json!({
            "type": "tool_call",
            "data": {
                "id": "tc_1",
                "name": "write_file",
                "input": {"path": "/p", "content": "x"},
                "status": "awaiting_permission",
                "kind": "edit",
                "requiresPermission": true
            }
        })
    );

    let progress = SessionUpdate::ToolCallUpdate(ToolCallUpdate {
        id: ToolCallId::from("tc_1"),
        status: ToolCallStatus::InProgress,
        output: None,
        error: None,
        duration: None,
    });
    assert_eq!(
        serde_json::to_value(&progress).unwrap(),
        json!({
            "type": "tool_call_update",
            "data": {"id": "tc_1", "status": "in_progress"}
        })
    );

    let done = SessionUpdate::ToolCallUpdate(ToolCallUpdate {
        id: ToolCallId::from("tc_1"),
        status: ToolCallStatus::Completed,
        output: Some(ToolCallContent::Diff {
            path: "/p".to_string(),
            hunks: vec![DiffHunk {
                old_start: 1,
                old_lines: 0,
                new_start: 1,
                new_lines: 1,
                content: "+x\n".to_string(),
            }],
        }),
        error: None,
        duration: Some(42),
    });
    assert_eq!(
        serde_json::to_value(&done).unwrap(),
        json!({
            "type": "tool_call_update",
            "data": {
                "id": "tc_1",
                "status": "completed",
                "output": {
                    "type": "diff",
                    "path": "/p",
                    "hunks": [{"oldStart": 1, "oldLines": 0, "newStart": 1, "newLines": 1, "content": "+x\n"}]
                },
                "duration": 42
            }
        })
    );
}

#[test]
fn permission_exchange() {
    let request = RequestPermissionRequest {
        session_id: SessionId::from("S"),
        operation: PermissionOperation::FileWrite,
        resource: "/p".to_string(),
        reason: Some("persist output".to_string()),
        tool_call_id: Some(ToolCallId::from("tc_1")),
        options: Some(vec![PermissionOption {
            id: "allow".to_string(),
            kind: PermissionOptionKind::AllowOnce,
            label: "Allow".to_string(),
            description: None,
            is_default: Some(true),
        }]),
        custom: None,
        meta: None,
    };
    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        json!({
            "sessionId": "S",
            "operation": "file_write",
            "resource": "/p",
            "reason": "persist output",
            "toolCallId": "tc_1",
            "options": [{"id": "allow", "kind": "allow_once", "label": "Allow", "isDefault": true}]
        })
    );

    let response: RequestPermissionResponse = serde_json::from_value(json!({
        "granted": true,
        "remember": false
    }))
    .unwrap();
    let decision = PermissionDecision::from_response(response);
    assert_eq!(decision.outcome, PermissionOutcome::Granted);
}

#[test]
fn terminal_exchange() {
    let create: CreateTerminalRequest = serde_json::from_value(json!({
        "sessionId": "S",
        "command": "echo",
        "args": ["x"]
    }))
    .unwrap();
    assert_eq!(create.command, "echo");
    assert_eq!(create.args, vec!["x"]);

    let output = TerminalOutputResponse {
        output: "x\n".to_string(),
        truncated: false,
        exit_status: Some(TerminalExitStatus {
            exit_code: Some(0),
            signal: None,
        }),
        meta: None,
    };
    assert_eq!(
        serde_json::to_value(&output).unwrap(),
        json!({
            "output": "x\n",
            "truncated": false,
            "exitStatus": {"exitCode": 0}
        })
    );

    let released = ReleaseTerminalResponse {
        released: true,
        meta: None,
    };
    assert_eq!(
        serde_json::to_value(&released).unwrap(),
        json!({"released": true})
    );
}

#[test]
fn prompt_response_with_usage() {
    let response = PromptResponse {
        stop_reason: StopReason::EndTurn,
        usage: Some(Usage {
            input_tokens: 12,
            output_tokens: 34,
            cached_input_tokens: None,
        }),
        meta: None,
    };
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({
            "stopReason": "end_turn",
            "usage": {"inputTokens": 12, "outputTokens": 34}
        })
    );
}

#[test]
fn cancel_is_plain_session_reference() {
    let notification = CancelNotification {
        session_id: SessionId::from("S"),
        reason: None,
        meta: None,
    };
    assert_eq!(
        serde_json::to_value(&notification).unwrap(),
        json!({"sessionId": "S"})
    );
}

#[test]
fn fs_read_exchange() {
    let request = ReadTextFileRequest {
        session_id: SessionId::from("S"),
        path: "/w/src/lib.rs".into(),
        start_line: Some(2),
        end_line: Some(3),
        meta: None,
    };
    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        json!({"sessionId": "S", "path": "/w/src/lib.rs", "startLine": 2, "endLine": 3})
    );

    let response = ReadTextFileResponse {
        content: "two\nthree".to_string(),
        encoding: DEFAULT_ENCODING.to_string(),
        total_lines: Some(5),
        truncated: Some(true),
        meta: None,
    };
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({
            "content": "two\nthree",
            "encoding": "utf-8",
            "totalLines": 5,
            "truncated": true
        })
    );
}
