//! Integration tests for the connection lifecycle and command dispatch.
//!
//! Each test scripts a mock projector on the far end of an in-memory
//! duplex stream: the device task sends the greeting, asserts the exact
//! bytes the engine puts on the wire, and replies line by line.  This
//! exercises the handshake, the codec, the serialized dispatch, and the
//! facades together through the public API.

use std::sync::Arc;
use std::time::Duration;

use pjlink::{
    ErrorLevel, InputMode, InputSource, LampStatus, MuteState, PjLink, PjLinkConfig, PjLinkError,
    PowerState,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off")))
        .try_init();
}

fn test_config() -> PjLinkConfig {
    PjLinkConfig {
        password: None,
        timeout: Duration::from_millis(500),
        trace_wire: true,
    }
}

/// Reads one raw CR-terminated line from the device side of the stream.
async fn device_read_line(stream: &mut DuplexStream) -> String {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        stream
            .read_exact(&mut byte)
            .await
            .expect("device expected another byte from the client");
        if byte[0] == b'\r' {
            break;
        }
        line.push(byte[0]);
    }
    String::from_utf8(line).expect("client sent non-UTF-8 bytes")
}

/// Asserts the device side sees end-of-stream without further bytes.
async fn device_expect_eof(stream: &mut DuplexStream) {
    let mut buf = [0u8; 1];
    let n = stream.read(&mut buf).await.expect("device read failed");
    assert_eq!(n, 0, "client sent unexpected bytes: {buf:?}");
}

// ── Handshake ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_open_greeting_power_query_round_trip() {
    init_tracing();
    let (client, mut device) = tokio::io::duplex(256);
    let device_task = tokio::spawn(async move {
        device.write_all(b"PJLINK 0\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%1POWR ?");
        device.write_all(b"%1POWR=1\r").await.unwrap();
        device
    });

    let link = PjLink::connect(client, test_config()).await.unwrap();
    assert_eq!(link.power().state().await.unwrap(), PowerState::On);

    drop(link);
    device_task.await.unwrap();
}

#[tokio::test]
async fn test_auth_greeting_requires_configured_password() {
    init_tracing();
    let (client, mut device) = tokio::io::duplex(256);
    tokio::spawn(async move {
        device.write_all(b"PJLINK 1 21d0e96e\r").await.unwrap();
        device_expect_eof(&mut device).await;
    });

    let result = PjLink::connect(client, test_config()).await;
    assert!(matches!(result, Err(PjLinkError::Handshake { .. })));
}

#[tokio::test]
async fn test_malformed_greeting_is_a_handshake_error() {
    init_tracing();
    let (client, mut device) = tokio::io::duplex(256);
    tokio::spawn(async move {
        device.write_all(b"PJLINK XXX\r").await.unwrap();
        device_expect_eof(&mut device).await;
    });

    let result = PjLink::connect(client, test_config()).await;
    assert!(matches!(result, Err(PjLinkError::Handshake { .. })));
}

#[tokio::test]
async fn test_missing_greeting_times_out_as_handshake_error() {
    init_tracing();
    let (client, _device) = tokio::io::duplex(256);

    let result = PjLink::connect(client, test_config()).await;
    assert!(matches!(result, Err(PjLinkError::Handshake { .. })));
}

// ── Authentication ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_auth_prefix_is_applied_to_exactly_one_command() {
    init_tracing();
    let (client, mut device) = tokio::io::duplex(256);
    let device_task = tokio::spawn(async move {
        device.write_all(b"PJLINK 1 21d0e96e\r").await.unwrap();
        // md5("21d0e96eabc123") prepended with no separator.
        assert_eq!(
            device_read_line(&mut device).await,
            "5e1a1d396463b20b9ce72a4d6cd91add%1POWR ?"
        );
        device.write_all(b"%1POWR=0\r").await.unwrap();
        // The second command carries no digest.
        assert_eq!(device_read_line(&mut device).await, "%1CLSS ?");
        device.write_all(b"%1CLSS=2\r").await.unwrap();
        device
    });

    let config = PjLinkConfig {
        password: Some("abc123".to_string()),
        ..test_config()
    };
    let link = PjLink::connect(client, config).await.unwrap();
    assert_eq!(link.power().state().await.unwrap(), PowerState::Off);
    assert_eq!(
        link.info().pjlink_class().await.unwrap(),
        pjlink::PjClass::Two
    );

    drop(link);
    device_task.await.unwrap();
}

#[tokio::test]
async fn test_auth_prefix_is_consumed_even_when_first_reply_is_malformed() {
    init_tracing();
    let (client, mut device) = tokio::io::duplex(256);
    let device_task = tokio::spawn(async move {
        device.write_all(b"PJLINK 1 21d0e96e\r").await.unwrap();
        assert_eq!(
            device_read_line(&mut device).await,
            "5e1a1d396463b20b9ce72a4d6cd91add%1POWR ?"
        );
        device.write_all(b"GARBAGE\r").await.unwrap();
        // The digest must not be replayed on the retry.
        assert_eq!(device_read_line(&mut device).await, "%1POWR ?");
        device.write_all(b"%1POWR=1\r").await.unwrap();
        device
    });

    let config = PjLinkConfig {
        password: Some("abc123".to_string()),
        ..test_config()
    };
    let link = PjLink::connect(client, config).await.unwrap();

    let first = link.power().state().await;
    assert!(matches!(
        first,
        Err(PjLinkError::MalformedResponse { .. })
    ));
    assert_eq!(link.power().state().await.unwrap(), PowerState::On);

    drop(link);
    device_task.await.unwrap();
}

#[tokio::test]
async fn test_rejected_digest_faults_the_connection() {
    init_tracing();
    let (client, mut device) = tokio::io::duplex(256);
    tokio::spawn(async move {
        device.write_all(b"PJLINK 1 21d0e96e\r").await.unwrap();
        let _ = device_read_line(&mut device).await;
        let _ = device.write_all(b"PJLINK ERRA\r").await;
        device_expect_eof(&mut device).await;
    });

    let config = PjLinkConfig {
        password: Some("wrong-password".to_string()),
        ..test_config()
    };
    let link = PjLink::connect(client, config).await.unwrap();

    assert_eq!(
        link.power().state().await,
        Err(PjLinkError::AuthenticationRejected)
    );
    // Fatal: later commands never touch the wire.
    assert_eq!(
        link.power().state().await,
        Err(PjLinkError::ConnectionUnusable)
    );
}

// ── Error classification ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_err2_maps_to_invalid_parameter_and_is_not_fatal() {
    init_tracing();
    let (client, mut device) = tokio::io::duplex(256);
    let device_task = tokio::spawn(async move {
        device.write_all(b"PJLINK 0\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%1POWR 1");
        device.write_all(b"%1POWR=ERR2\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%1POWR ?");
        device.write_all(b"%1POWR=0\r").await.unwrap();
        device
    });

    let link = PjLink::connect(client, test_config()).await.unwrap();

    let result = link.power().turn_on().await;
    assert_eq!(
        result,
        Err(PjLinkError::InvalidParameter {
            command: pjlink::CommandCode::POWER
        })
    );
    // The connection stays ready for the next command.
    assert_eq!(link.power().state().await.unwrap(), PowerState::Off);

    drop(link);
    device_task.await.unwrap();
}

#[tokio::test]
async fn test_err1_on_lamp_maps_to_undefined_command() {
    init_tracing();
    let (client, mut device) = tokio::io::duplex(256);
    let device_task = tokio::spawn(async move {
        device.write_all(b"PJLINK 0\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%1LAMP ?");
        device.write_all(b"%1LAMP=ERR1\r").await.unwrap();
        device
    });

    let link = PjLink::connect(client, test_config()).await.unwrap();
    assert_eq!(
        link.lamps().status().await,
        Err(PjLinkError::UndefinedCommand {
            command: pjlink::CommandCode::LAMP
        })
    );

    drop(link);
    device_task.await.unwrap();
}

#[tokio::test]
async fn test_class_echo_mismatch_is_malformed_but_not_fatal() {
    init_tracing();
    let (client, mut device) = tokio::io::duplex(256);
    let device_task = tokio::spawn(async move {
        device.write_all(b"PJLINK 0\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%1POWR ?");
        device.write_all(b"%2POWR=1\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%1POWR ?");
        device.write_all(b"%1POWR=1\r").await.unwrap();
        device
    });

    let link = PjLink::connect(client, test_config()).await.unwrap();
    assert!(matches!(
        link.power().state().await,
        Err(PjLinkError::MalformedResponse { .. })
    ));
    assert_eq!(link.power().state().await.unwrap(), PowerState::On);

    drop(link);
    device_task.await.unwrap();
}

// ── Serialization, timeouts, teardown ─────────────────────────────────────────

#[tokio::test]
async fn test_concurrent_sends_reach_the_wire_in_fifo_order() {
    init_tracing();
    let (client, mut device) = tokio::io::duplex(256);
    let device_task = tokio::spawn(async move {
        device.write_all(b"PJLINK 0\r").await.unwrap();
        // One command at a time, in issue order, never interleaved.
        assert_eq!(device_read_line(&mut device).await, "%1POWR ?");
        device.write_all(b"%1POWR=1\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%1CLSS ?");
        device.write_all(b"%1CLSS=1\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%1AVMT ?");
        device.write_all(b"%1AVMT=30\r").await.unwrap();
        device
    });

    let link = PjLink::connect(client, test_config()).await.unwrap();
    // The facades must outlive the joined futures that borrow them.
    let power_group = link.power();
    let info_group = link.info();
    let mute_group = link.mute();
    let (power, class, mute) = tokio::join!(
        power_group.state(),
        info_group.pjlink_class(),
        mute_group.status(),
    );
    assert_eq!(power.unwrap(), PowerState::On);
    assert_eq!(class.unwrap(), pjlink::PjClass::One);
    assert_eq!(
        mute.unwrap(),
        MuteState {
            video: false,
            audio: false
        }
    );

    drop(link);
    device_task.await.unwrap();
}

#[tokio::test]
async fn test_timeout_faults_the_connection_and_blocks_cross_talk() {
    init_tracing();
    let (client, mut device) = tokio::io::duplex(256);
    let device_task = tokio::spawn(async move {
        device.write_all(b"PJLINK 0\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%1POWR ?");
        // Sit on the reply until after the client's deadline.
        tokio::time::sleep(Duration::from_millis(300)).await;
        let _ = device.write_all(b"%1POWR=1\r").await;
        // The faulted client must never issue another command.
        device_expect_eof(&mut device).await;
    });

    let config = PjLinkConfig {
        timeout: Duration::from_millis(100),
        ..test_config()
    };
    let link = PjLink::connect(client, config).await.unwrap();

    let first = link.power().state().await;
    assert!(matches!(first, Err(PjLinkError::Timeout { .. })));

    // The late reply is never attributed to this next call.
    assert_eq!(
        link.power().state().await,
        Err(PjLinkError::ConnectionUnusable)
    );

    device_task.await.unwrap();
}

#[tokio::test]
async fn test_close_while_a_send_is_pending_resolves_it() {
    init_tracing();
    let (client, mut device) = tokio::io::duplex(256);
    tokio::spawn(async move {
        device.write_all(b"PJLINK 0\r").await.unwrap();
        // Swallow the command and never reply.
        let _ = device_read_line(&mut device).await;
        device_expect_eof(&mut device).await;
    });

    let config = PjLinkConfig {
        timeout: Duration::from_secs(30),
        ..test_config()
    };
    let link = Arc::new(PjLink::connect(client, config).await.unwrap());

    let pending = {
        let link = Arc::clone(&link);
        tokio::spawn(async move { link.power().state().await })
    };
    // Let the command reach the wire before closing.
    tokio::time::sleep(Duration::from_millis(50)).await;
    link.close();

    let result = pending.await.unwrap();
    assert_eq!(result, Err(PjLinkError::ConnectionUnusable));

    // Fail fast after close, without touching the transport.
    assert_eq!(
        link.power().state().await,
        Err(PjLinkError::ConnectionUnusable)
    );
}

#[tokio::test]
async fn test_uncorrelated_reply_is_skipped_not_misattributed() {
    init_tracing();
    let (client, mut device) = tokio::io::duplex(256);
    let device_task = tokio::spawn(async move {
        device.write_all(b"PJLINK 0\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%1POWR ?");
        // An unsolicited status line arrives ahead of the real reply.
        device.write_all(b"%2LKUP=ACK\r").await.unwrap();
        device.write_all(b"%1POWR=2\r").await.unwrap();
        device
    });

    let link = PjLink::connect(client, test_config()).await.unwrap();
    assert_eq!(link.power().state().await.unwrap(), PowerState::Cooling);

    drop(link);
    device_task.await.unwrap();
}

// ── Facade conversions over the wire ──────────────────────────────────────────

#[tokio::test]
async fn test_lamp_reply_maps_to_ordered_records() {
    init_tracing();
    let (client, mut device) = tokio::io::duplex(256);
    let device_task = tokio::spawn(async move {
        device.write_all(b"PJLINK 0\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%1LAMP ?");
        device.write_all(b"%1LAMP=1234 1\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%1LAMP ?");
        device.write_all(b"%1LAMP=8000 1 2000 0\r").await.unwrap();
        device
    });

    let link = PjLink::connect(client, test_config()).await.unwrap();
    assert_eq!(
        link.lamps().status().await.unwrap(),
        vec![LampStatus { hours: 1234, lit: true }]
    );
    assert_eq!(
        link.lamps().status().await.unwrap(),
        vec![
            LampStatus { hours: 8000, lit: true },
            LampStatus { hours: 2000, lit: false },
        ]
    );

    drop(link);
    device_task.await.unwrap();
}

#[tokio::test]
async fn test_error_status_report_maps_each_subsystem() {
    init_tracing();
    let (client, mut device) = tokio::io::duplex(256);
    let device_task = tokio::spawn(async move {
        device.write_all(b"PJLINK 0\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%1ERST ?");
        device.write_all(b"%1ERST=010020\r").await.unwrap();
        device
    });

    let link = PjLink::connect(client, test_config()).await.unwrap();
    let report = link.errors().query().await.unwrap();
    assert_eq!(report.fan, ErrorLevel::Ok);
    assert_eq!(report.lamp, ErrorLevel::Warning);
    assert_eq!(report.temperature, ErrorLevel::Ok);
    assert_eq!(report.cover, ErrorLevel::Ok);
    assert_eq!(report.filter, ErrorLevel::Error);
    assert_eq!(report.other, ErrorLevel::Ok);

    drop(link);
    device_task.await.unwrap();
}

#[tokio::test]
async fn test_source_selection_and_enumeration() {
    init_tracing();
    let (client, mut device) = tokio::io::duplex(256);
    let device_task = tokio::spawn(async move {
        device.write_all(b"PJLINK 0\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%1INPT 31");
        device.write_all(b"%1INPT=OK\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%1INST ?");
        device.write_all(b"%1INST=11 31 51\r").await.unwrap();
        device
    });

    let link = PjLink::connect(client, test_config()).await.unwrap();

    let digital = InputSource::new(InputMode::Digital, '1').unwrap();
    link.sources().select(digital).await.unwrap();

    let available = link.sources().available().await.unwrap();
    assert_eq!(
        available,
        vec![
            InputSource::new(InputMode::Rgb, '1').unwrap(),
            InputSource::new(InputMode::Digital, '1').unwrap(),
            InputSource::new(InputMode::Network, '1').unwrap(),
        ]
    );

    drop(link);
    device_task.await.unwrap();
}

#[tokio::test]
async fn test_source_names_tolerate_err2_per_input() {
    init_tracing();
    let (client, mut device) = tokio::io::duplex(256);
    let device_task = tokio::spawn(async move {
        device.write_all(b"PJLINK 0\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%2INST ?");
        device.write_all(b"%2INST=11 31\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%2INNM ?11");
        device.write_all(b"%2INNM=Computer\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%2INNM ?31");
        device.write_all(b"%2INNM=ERR2\r").await.unwrap();
        device
    });

    let link = PjLink::connect(client, test_config()).await.unwrap();
    let named = link.sources().available_with_names().await.unwrap();
    assert_eq!(
        named,
        vec![
            (
                InputSource::new(InputMode::Rgb, '1').unwrap(),
                Some("Computer".to_string())
            ),
            (InputSource::new(InputMode::Digital, '1').unwrap(), None),
        ]
    );

    drop(link);
    device_task.await.unwrap();
}

#[tokio::test]
async fn test_class_two_extensions_render_and_convert() {
    init_tracing();
    let (client, mut device) = tokio::io::duplex(256);
    let device_task = tokio::spawn(async move {
        device.write_all(b"PJLINK 0\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%2FREZ 1");
        device.write_all(b"%2FREZ=OK\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%2FREZ ?");
        device.write_all(b"%2FREZ=1\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%2FILT ?");
        device.write_all(b"%2FILT=300\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%2SVOL 1");
        device.write_all(b"%2SVOL=OK\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%2MVOL 0");
        device.write_all(b"%2MVOL=OK\r").await.unwrap();
        device
    });

    let link = PjLink::connect(client, test_config()).await.unwrap();
    link.freeze().set(true).await.unwrap();
    assert!(link.freeze().frozen().await.unwrap());
    assert_eq!(link.filter().hours().await.unwrap(), 300);
    link.speaker().up().await.unwrap();
    link.microphone().down().await.unwrap();

    drop(link);
    device_task.await.unwrap();
}

#[tokio::test]
async fn test_info_snapshot_tolerates_unsupported_fields() {
    init_tracing();
    let (client, mut device) = tokio::io::duplex(256);
    let device_task = tokio::spawn(async move {
        device.write_all(b"PJLINK 0\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%1NAME ?");
        device.write_all(b"%1NAME=Front Room\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%1INF1 ?");
        device.write_all(b"%1INF1=EPSON\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%1INF2 ?");
        device.write_all(b"%1INF2=ERR1\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%1INFO ?");
        device.write_all(b"%1INFO=\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%1CLSS ?");
        device.write_all(b"%1CLSS=2\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%2SNUM ?");
        device.write_all(b"%2SNUM=ERR1\r").await.unwrap();
        assert_eq!(device_read_line(&mut device).await, "%2SVER ?");
        device.write_all(b"%2SVER=1.00\r").await.unwrap();
        device
    });

    let link = PjLink::connect(client, test_config()).await.unwrap();
    let info = link.info().snapshot().await.unwrap();
    assert_eq!(
        info,
        pjlink::DeviceInfo {
            projector_name: Some("Front Room".to_string()),
            manufacturer: Some("EPSON".to_string()),
            product_name: None,
            other_info: Some(String::new()),
            pjlink_class: Some(pjlink::PjClass::Two),
            serial_number: None,
            software_version: Some("1.00".to_string()),
        }
    );

    drop(link);
    device_task.await.unwrap();
}

#[tokio::test]
async fn test_facade_validation_rejects_before_any_io() {
    init_tracing();
    let (client, mut device) = tokio::io::duplex(256);
    let device_task = tokio::spawn(async move {
        device.write_all(b"PJLINK 0\r").await.unwrap();
        // Nothing may arrive: the argument was rejected client-side.
        device_expect_eof(&mut device).await;
    });

    let link = PjLink::connect(client, test_config()).await.unwrap();

    let result = link.power().set(PowerState::Cooling).await;
    assert!(matches!(result, Err(PjLinkError::Validation { .. })));
    assert!(matches!(
        InputSource::new(InputMode::Rgb, '0'),
        Err(PjLinkError::Validation { .. })
    ));

    drop(link);
    device_task.await.unwrap();
}
