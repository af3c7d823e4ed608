use mesh_plex::prelude::*;

#[test]
fn thread_comm_round_trip() {
    let tag = CommTag::new(0x1000);
    let c0 = ThreadComm::new(0, 2);
    let c1 = ThreadComm::new(1, 2);

    let msg = b"hello";
    let _s = c0.isend(1, tag.as_u16(), msg);

    let h = c1.irecv(0, tag.as_u16(), msg.len());
    let got = h.wait().unwrap();
    assert_eq!(&got, msg);
}

#[test]
fn thread_comm_fifo_order() {
    let tag = CommTag::new(0x1010);
    let c0 = ThreadComm::new(0, 2);
    let c1 = ThreadComm::new(1, 2);

    for i in 0..10u8 {
        let _ = c0.isend(1, tag.as_u16(), &[i]);
    }
    let mut out = Vec::new();
    for _ in 0..10 {
        let h = c1.irecv(0, tag.as_u16(), 1);
        out.push(h.wait().unwrap()[0]);
    }
    assert_eq!(out, (0u8..10u8).collect::<Vec<_>>());
}

#[test]
fn thread_comm_truncates_to_requested_length() {
    let tag = CommTag::new(0x1020);
    let c0 = ThreadComm::new(0, 2);
    let c1 = ThreadComm::new(1, 2);

    let _ = c0.isend(1, tag.as_u16(), &[1, 2, 3, 4, 5, 6]);
    let h = c1.irecv(0, tag.as_u16(), 4);
    assert_eq!(h.wait().unwrap(), vec![1, 2, 3, 4]);
}

#[test]
fn no_comm_is_a_single_rank() {
    let comm = NoComm;
    assert_eq!(comm.rank(), 0);
    assert_eq!(comm.size(), 1);
    comm.barrier();
}

#[test]
fn tags_offset_with_wrapping() {
    let t = CommTag::new(u16::MAX);
    assert_eq!(t.offset(1).as_u16(), 0);
    assert_eq!(CommTag::from(7u16).as_u16(), 7);
}
