//! Tag propagation across metadata copies, data copies and lifting of plain buffers.
use std::sync::Arc;

use taggable_array::{
    to_tagged_buffer, untagged_axes, Axis, Buffer, CopyArgs, CopyQueue, DType, HostBuffer,
    HostQueue, Order, Tag, TagSet, Taggable, TaggedBuffer, TaggedBufferError,
};

fn plain_buffer(shape: &[usize]) -> HostBuffer {
    HostBuffer::builder(shape, DType::F32)
        .order(Order::F)
        .offset(16)
        .queue(HostQueue(1))
        .build()
        .unwrap()
}

fn tags(names: &[&str]) -> TagSet {
    names.iter().map(|name| Tag::new(*name)).collect()
}

#[track_caller]
fn check_aliases(first: &HostBuffer, second: &HostBuffer) {
    assert_eq!(first.storage_id(), second.storage_id());
    assert_eq!(first.offset(), second.offset());
    assert_eq!(first.strides(), second.strides());
    assert_eq!(first.size(), second.size());
    assert_eq!(first.queue(), second.queue());
    assert_eq!(first.events(), second.events());
}

#[test]
fn default_axes_for_every_rank() {
    for rank in 0..6 {
        let shape = vec![2; rank];
        let tagged = TaggedBuffer::new(plain_buffer(&shape), None, TagSet::default()).unwrap();
        assert_eq!(tagged.axes().len(), rank);
        assert!(tagged.axes().iter().all(|axis| axis.tags().is_empty()));
    }
}

#[test]
fn construction_rejects_wrong_axis_count() {
    for axes in [0, 1, 3, 4] {
        let res = TaggedBuffer::new(
            plain_buffer(&[2, 2]),
            Some(vec![Axis::default(); axes]),
            TagSet::default(),
        );
        assert_eq!(
            res.unwrap_err(),
            TaggedBufferError::ShapeAxisMismatch { ndim: 2, axes }
        );
    }
}

#[test]
fn lift_rejects_wrong_axis_count() {
    let plain = plain_buffer(&[3]);
    let res = to_tagged_buffer(&plain, Some(Vec::new()), TagSet::default());
    assert!(matches!(
        res,
        Err(TaggedBufferError::ShapeAxisMismatch { ndim: 1, axes: 0 })
    ));
}

#[test]
fn metadata_copy_aliases_storage() {
    let original = to_tagged_buffer(&plain_buffer(&[4, 4]), None, tags(&["a"])).unwrap();
    let copy = original.copy(CopyArgs::new().tags(tags(&["b"]))).unwrap();

    check_aliases(original.buffer(), copy.buffer());
    assert_eq!(copy.tags(), &tags(&["b"]));
    assert_eq!(copy.axes(), original.axes());
    assert_eq!(original.tags(), &tags(&["a"]));
}

#[test]
fn data_copy_preserves_metadata_on_new_storage() {
    let original = to_tagged_buffer(&plain_buffer(&[4, 4]), None, tags(&["boundary"]))
        .unwrap()
        .with_tagged_axis(0, [Tag::new("batch")])
        .unwrap();

    for queue in [
        CopyQueue::Inherit,
        CopyQueue::Detached,
        CopyQueue::To(HostQueue(2)),
    ] {
        let copy = original.copy(CopyArgs::new().queue(queue)).unwrap();
        assert_ne!(copy.buffer().storage_id(), original.buffer().storage_id());
        assert_eq!(copy.buffer().storage_bytes(), original.buffer().storage_bytes());
        assert_eq!(copy.tags(), original.tags());
        assert_eq!(copy.axes(), original.axes());
    }
}

#[test]
fn queue_cannot_be_combined_with_metadata() {
    let original = to_tagged_buffer(&plain_buffer(&[2]), None, tags(&["a"])).unwrap();
    let before = original.metadata();

    let with_tags = original.copy(CopyArgs::new().queue(HostQueue(5)).tags(tags(&["b"])));
    let with_axes = original.copy(
        CopyArgs::new()
            .queue(HostQueue(5))
            .axes(vec![Axis::new(Tag::new("x"))]),
    );

    assert_eq!(
        with_tags.unwrap_err(),
        TaggedBufferError::IncompatibleCopyArguments
    );
    assert_eq!(
        with_axes.unwrap_err(),
        TaggedBufferError::IncompatibleCopyArguments
    );
    assert_eq!(original.metadata(), before);
}

#[test]
fn axis_tagging_is_positional() {
    let original = to_tagged_buffer(
        &plain_buffer(&[2, 3, 4]),
        Some(vec![
            Axis::new(tags(&["x"])),
            Axis::new(tags(&["y"])),
            Axis::new(tags(&["z"])),
        ]),
        TagSet::default(),
    )
    .unwrap();

    for i in 0..3 {
        let tagged = original.with_tagged_axis(i, [Tag::new("t")]).unwrap();
        let expected = original.axes()[i].tags().tagged([Tag::new("t")]);
        assert_eq!(tagged.axes()[i].tags(), &expected);
        assert!(tagged.axes()[i].tags().is_superset(original.axes()[i].tags()));
        for j in (0..3).filter(|j| *j != i) {
            assert_eq!(tagged.axes()[j], original.axes()[j]);
        }
        check_aliases(original.buffer(), tagged.buffer());
    }

    assert_eq!(original.axes()[1].tags(), &tags(&["y"]));
}

#[test]
fn axis_tagging_out_of_range() {
    let original = TaggedBuffer::untagged(plain_buffer(&[2, 3]));
    assert_eq!(
        original.with_tagged_axis(5, [Tag::new("t")]).unwrap_err(),
        TaggedBufferError::AxisOutOfRange { axis: 5, ndim: 2 }
    );
    assert_eq!(
        original.with_untagged_axis(2, [Tag::new("t")]).unwrap_err(),
        TaggedBufferError::AxisOutOfRange { axis: 2, ndim: 2 }
    );
}

#[test]
fn tagging_is_idempotent() {
    let extra = [Tag::new("a"), Tag::with_payload("b", "2")];
    let container = tags(&["c"]);
    assert_eq!(
        container.tagged(extra.clone()).tagged(extra.clone()),
        container.tagged(extra.clone())
    );

    let axis = Axis::new(tags(&["c"]));
    assert_eq!(
        axis.tagged(extra.clone()).tagged(extra.clone()),
        axis.tagged(extra)
    );
}

#[test]
fn round_trip_lift() {
    let plain = plain_buffer(&[3, 1, 2]);
    let tagged = to_tagged_buffer(&plain, None, TagSet::default()).unwrap();
    let default = TaggedBuffer::new(plain_buffer(&[3, 1, 2]), None, TagSet::default()).unwrap();

    assert_eq!(tagged.axes(), default.axes());
    check_aliases(&plain, tagged.buffer());
    assert_eq!(tagged.buffer().dtype(), plain.dtype());
    assert_eq!(tagged.buffer().order(), plain.order());
    assert_eq!(tagged.buffer().context(), plain.context());

    let back = tagged.into_buffer();
    check_aliases(&plain, &back);
}

#[test]
fn untagged_buffers_share_default_axes() {
    let first = TaggedBuffer::untagged(plain_buffer(&[2, 2, 2, 2]));
    let second = TaggedBuffer::untagged(plain_buffer(&[5, 1, 1, 3]));
    assert!(std::ptr::eq(first.axes(), second.axes()));
    assert!(Arc::ptr_eq(&untagged_axes(4), &untagged_axes(4)));
}

#[test]
fn tagged_buffers_are_shareable_between_threads() {
    let original = Arc::new(
        to_tagged_buffer(&plain_buffer(&[8, 8]), None, tags(&["shared"])).unwrap(),
    );
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let original = Arc::clone(&original);
            std::thread::spawn(move || {
                original
                    .with_tagged_axis(i % 2, [Tag::with_payload("thread", i.to_string())])
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        let tagged = handle.join().unwrap();
        assert_eq!(tagged.tags(), original.tags());
        assert_eq!(tagged.buffer().storage_id(), original.buffer().storage_id());
    }
    assert!(original.axes().iter().all(|axis| axis.tags().is_empty()));
}
