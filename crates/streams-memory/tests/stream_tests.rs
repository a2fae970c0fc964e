//! Integration tests for bounded replay streams

use assert_matches::assert_matches;
use flowline_streams::{
    Handle, Header, Message, NodeRef, Payload, ReplayStream, SetId, Stream, StreamReader,
    StreamState,
};
use flowline_streams_memory::{Error, MemoryStream, MemoryStreamOptions};
use serde_json::json;

fn stream_with_capacity(node: NodeRef, name: &str, capacity: usize) -> MemoryStream<u64> {
    let handle = Handle::new(SetId::new(), node, name);
    let options = MemoryStreamOptions {
        capacity,
        ..Default::default()
    };

    MemoryStream::new(handle, options).unwrap()
}

#[test]
fn test_window_of_three() {
    let stream = stream_with_capacity(NodeRef::new("player"), "ticks", 3);
    let handle = stream.handle().clone();

    // Append -1, 0, 1, 2, 3
    stream.append(handle.announce().unwrap()).unwrap();
    for tick in 0..4 {
        stream.append(handle.data(tick).unwrap()).unwrap();
    }

    assert_matches!(
        stream.get(&handle.request(0)),
        Err(Error::RequestedMessageTooOld { index: 0, offset: 3 })
    );

    let second = stream.get(&handle.request(2)).unwrap().unwrap();
    assert_eq!(second.payload(), &Payload::Data(2));

    let third = stream.get(&handle.request(3)).unwrap().unwrap();
    assert_eq!(third.payload(), &Payload::Data(3));

    assert!(stream.get(&handle.request(4)).unwrap().is_none());
}

#[test]
fn test_group_stream_fan_out() {
    let stream = stream_with_capacity(NodeRef::group("bag"), "topics", 10);
    let handle = stream.handle().clone();

    let child = stream.spawn_child("imu", false, Header::new()).unwrap();
    let child_handle = child.handle().clone();

    stream.append(handle.announce().unwrap()).unwrap();
    stream
        .append(handle.mint(Payload::Handle(child_handle.clone())).unwrap())
        .unwrap();
    stream.append(handle.finish().unwrap()).unwrap();

    assert!(stream.is_ended());
    assert_eq!(stream.state(), StreamState::Ended);

    let announced = stream.get(&handle.request(0)).unwrap().unwrap();
    assert_eq!(announced.payload().as_handle(), Some(&child_handle));

    // The end was delivered at index 1
    assert!(stream.get(&handle.request(2)).unwrap().is_none());
}

#[test]
fn test_out_of_order_append_regardless_of_payload() {
    let stream = stream_with_capacity(NodeRef::group("bag"), "topics", 10);
    let handle = stream.handle().clone();
    let wrong_kind = Message::new(Some(3), handle.clone(), Payload::Data(1)).unwrap();

    // Invalid payload for a group stream, but the index is checked first
    assert_matches!(
        stream.append(wrong_kind),
        Err(Error::OutOfOrderAppend { expected: -1, actual: 3 })
    );

    stream.append(handle.announce().unwrap()).unwrap();

    let duplicate = Message::new(Some(-1), handle.clone(), Payload::End).unwrap();
    assert_matches!(
        stream.append(duplicate),
        Err(Error::OutOfOrderAppend { expected: 0, actual: -1 })
    );

    let gap = Message::new(Some(2), handle, Payload::End).unwrap();
    assert_matches!(
        stream.append(gap),
        Err(Error::OutOfOrderAppend { expected: 0, actual: 2 })
    );
}

#[test]
fn test_append_after_end() {
    let stream = stream_with_capacity(NodeRef::new("player"), "ticks", 3);
    let handle = stream.handle().clone();

    stream.append(handle.announce().unwrap()).unwrap();
    stream.append(handle.finish().unwrap()).unwrap();

    assert_matches!(
        stream.append(handle.data(1).unwrap()),
        Err(Error::StreamAlreadyEnded(_))
    );
    assert_matches!(
        stream.append(handle.finish().unwrap()),
        Err(Error::StreamAlreadyEnded(_))
    );
    assert!(stream.is_ended());
}

#[test]
fn test_payload_kind_checks() {
    let group = stream_with_capacity(NodeRef::group("bag"), "topics", 10);
    let group_handle = group.handle().clone();
    group.append(group_handle.announce().unwrap()).unwrap();

    let data_on_group = Message::new(Some(0), group_handle.clone(), Payload::Data(9)).unwrap();
    assert_matches!(
        group.append(data_on_group),
        Err(Error::InvalidGroupPayload { index: 0, .. })
    );

    let data = stream_with_capacity(NodeRef::new("player"), "ticks", 10);
    let data_handle = data.handle().clone();
    data.append(data_handle.announce().unwrap()).unwrap();

    let handle_on_data = data_handle.mint(Payload::Handle(group_handle)).unwrap();
    assert_matches!(
        data.append(handle_on_data),
        Err(Error::InvalidDataPayload { index: 0, .. })
    );
}

#[test]
fn test_spawn_child_on_data_stream() {
    let stream = stream_with_capacity(NodeRef::new("player"), "ticks", 3);

    assert_matches!(
        stream.spawn_child("child", false, Header::new()),
        Err(Error::NotAGroupHandle(_))
    );
}

#[test]
fn test_spawned_child_shares_address_scope() {
    let stream = stream_with_capacity(NodeRef::group("bag"), "topics", 3);
    let mut header = Header::new();
    header.insert("encoding".to_string(), json!("cdr"));

    let child = stream.spawn_child("lidar", true, header).unwrap();

    assert_eq!(child.set_id(), stream.set_id());
    assert_eq!(child.node(), stream.node());
    assert_eq!(child.name(), "lidar");
    assert!(child.is_group());
    assert_eq!(child.handle().attribute("encoding").unwrap(), &json!("cdr"));
    assert!(child.parent().unwrap().ptr_eq(&stream));
}

#[test]
fn test_independent_readers() {
    let stream = stream_with_capacity(NodeRef::new("player"), "ticks", 4);
    let handle = stream.handle().clone();
    let mut fast = StreamReader::new(handle.clone());
    let mut slow = StreamReader::new(handle.clone());

    stream.append(handle.announce().unwrap()).unwrap();
    stream.append(handle.data(10).unwrap()).unwrap();

    assert!(fast.poll(&stream).unwrap().unwrap().is_announcement());
    assert_eq!(fast.poll(&stream).unwrap().unwrap().payload(), &Payload::Data(10));
    assert!(fast.poll(&stream).unwrap().is_none());
    assert_eq!(fast.next_index(), 1);

    for tick in 11..14 {
        stream.append(handle.data(tick).unwrap()).unwrap();
    }
    stream.append(handle.finish().unwrap()).unwrap();

    // The slow reader fell out of the window while the fast one kept up
    assert_matches!(
        slow.poll(&stream),
        Err(Error::RequestedMessageTooOld { index: -1, .. })
    );
    assert_eq!(slow.next_index(), -1);

    let mut seen = Vec::new();
    while let Some(message) = fast.poll(&stream).unwrap() {
        seen.push(message.index());
    }
    assert_eq!(seen, vec![Some(1), Some(2), Some(3), Some(4)]);
    assert!(fast.is_finished());
    assert!(fast.poll(&stream).unwrap().is_none());
}

#[test]
fn test_reader_resubscribes_after_falling_behind() {
    let stream = stream_with_capacity(NodeRef::new("player"), "ticks", 2);
    let handle = stream.handle().clone();
    let mut reader = StreamReader::new(handle.clone());

    stream.append(handle.announce().unwrap()).unwrap();
    for tick in 0..5 {
        stream.append(handle.data(tick).unwrap()).unwrap();
    }

    assert!(reader.poll(&stream).is_err());
    assert_eq!(reader.resubscribe(&stream), Some(3));

    let message = reader.poll(&stream).unwrap().unwrap();
    assert_eq!(message.payload(), &Payload::Data(3));

    // Positions never move backwards
    reader.skip_to(0);
    assert_eq!(reader.next_index(), 4);
}

#[test]
fn test_reader_on_empty_stream() {
    let stream = stream_with_capacity(NodeRef::new("player"), "ticks", 2);
    let mut reader = StreamReader::new(stream.handle().clone());

    assert!(reader.poll(&stream).unwrap().is_none());
    assert_eq!(reader.resubscribe(&stream), None);
}

#[test]
fn test_runtime_fulfills_child_requests() {
    let parent = stream_with_capacity(NodeRef::group("bag"), "topics", 5);
    let parent_handle = parent.handle().clone();

    let requests = ["imu", "gps"]
        .into_iter()
        .map(|name| {
            parent_handle
                .request_child_stream(name, false, Header::new())
                .unwrap()
        })
        .collect::<Vec<_>>();

    parent.append(parent_handle.announce().unwrap()).unwrap();
    for request in &requests {
        let child = parent.fulfill(request).unwrap();
        parent
            .append(parent_handle.mint(Payload::Handle(child.handle().clone())).unwrap())
            .unwrap();
    }
    parent.append(parent_handle.finish().unwrap()).unwrap();

    let names = (0..2)
        .map(|index| {
            let message = parent.get(&parent_handle.request(index)).unwrap().unwrap();
            message.payload().as_handle().unwrap().name().to_string()
        })
        .collect::<Vec<_>>();

    assert_eq!(names, vec!["imu", "gps"]);
    assert_matches!(
        parent.fulfill(&requests[0]),
        Err(Error::DuplicateChildName(_))
    );
}
