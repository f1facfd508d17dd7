use std::fs;
use std::path::PathBuf;

use vm_translator::io::{parse_disk_image, read_virtual_addresses, write_results, InitData};
use vm_translator::{
    Disk, Entry, FreeFrameList, PhysicalMemory, TranslationResult, VMManager, VmError, NUM_FRAMES,
};

/// Segment 0 of length 1024 whose page table sits on disk block 5; the page
/// table's entry 0 points at block 7. Only frames 10 and 11 are free.
fn scenario_a(demand_paging: bool) -> VMManager {
    let mut pm = PhysicalMemory::new();
    pm.set_segment_entry(0, 1024, -5);

    let mut blocks = vec![Vec::new(); 8];
    blocks[5] = vec![-7];
    blocks[7] = vec![1, 2, 3, 4];
    let disk = Disk::from_blocks(blocks).unwrap();

    VMManager::new(pm, disk, [10usize, 11].into_iter().collect(), demand_paging)
}

#[test]
fn scenario_a_two_faults_drain_the_pool() {
    let mut vm = scenario_a(true);

    assert_eq!(vm.translate(3).unwrap(), TranslationResult::Success(11 * 512 + 3));
    assert!(vm.free_frames().is_empty());
    assert_eq!(vm.memory().segment_entry(0), Entry::Resident(10));
    assert_eq!(vm.memory().page_entry(10, 0), Entry::Resident(11));
    assert_eq!(vm.memory().read(11 * 512 + 3), 4);

    // everything is resident now, no further frames needed
    assert_eq!(vm.translate(3).unwrap(), TranslationResult::Success(5635));
    assert_eq!(vm.stats().faults(), 2);
}

#[test]
fn scenario_b_paging_off_changes_nothing() {
    let mut vm = scenario_a(false);

    assert_eq!(vm.translate_batch(&[3]).unwrap(), vec![-1]);
    assert_eq!(vm.free_frames().frames().collect::<Vec<_>>(), vec![10, 11]);
    assert_eq!(vm.memory().segment_pointer(0), -5);
    assert!(vm.memory().frame(10).iter().all(|&w| w == 0));
}

#[test]
fn scenario_c_zero_length_segment_always_fails() {
    for demand_paging in [false, true] {
        let init = InitData::parse("4 0 3\n4 0 10").unwrap();
        let mut vm = VMManager::from_init(&init, NUM_FRAMES, Disk::new(), demand_paging).unwrap();
        let vas: Vec<i64> = (0..512).step_by(37).map(|w| (4 << 18) | w).collect();
        let results = vm.translate_batch(&vas).unwrap();
        assert!(results.iter().all(|&r| r == -1));
    }
}

#[test]
fn fault_with_empty_pool_aborts() {
    // page 1 of the same page table lives on block 6, but the pool runs dry first
    let mut pm = PhysicalMemory::new();
    pm.set_segment_entry(0, 1024, -5);
    let mut blocks = vec![Vec::new(); 8];
    blocks[5] = vec![-7, -6];
    let disk = Disk::from_blocks(blocks).unwrap();
    let mut vm = VMManager::new(pm, disk, [10usize, 11].into_iter().collect(), true);

    assert!(vm.translate(3).unwrap().is_success());
    assert!(vm.free_frames().is_empty());

    let err = vm.translate((1 << 9) | 3).unwrap_err();
    assert!(matches!(err, VmError::OutOfFrames { .. }));
    assert_eq!(vm.memory().page_entry(10, 1), Entry::OnDisk(6));
}

#[test]
fn empty_pool_is_built_from_init() {
    let init = InitData::parse("1 512 2\n1 0 3").unwrap();
    let (_, ffl) = init.build(4).unwrap();
    assert_eq!(ffl.free_count(), 0);
    assert_eq!(FreeFrameList::default().free_count(), 0);
}

struct Workdir(PathBuf);

impl Workdir {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("vm-translator-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        Workdir(dir)
    }

    fn file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.0.join(name);
        fs::write(&path, content).unwrap();
        path
    }
}

impl Drop for Workdir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

#[test]
fn demand_paging_workload_through_files() {
    let dir = Workdir::new("demand");
    let init = dir.file("init.txt", "8 4000 3 9 5000 -7\n8 0 10 8 1 -20 9 0 13 9 1 -25\n");
    let input = dir.file("input.txt", "2097162 2097674 2359306 2359818");
    let output = dir.0.join("output.txt");

    let init = InitData::from_file(&init).unwrap();
    assert!(init.needs_demand_paging());
    let disk = parse_disk_image("7 0 13 7 1 -25").unwrap();
    let mut vm = VMManager::from_init(&init, NUM_FRAMES, disk, true).unwrap();

    let vas = read_virtual_addresses(&input).unwrap();
    let results = vm.translate_batch(&vas).unwrap();
    write_results(&output, &results).unwrap();

    assert_eq!(fs::read_to_string(&output).unwrap(), "5130 1034 6666 2570");
}

#[test]
fn basic_workload_through_files() {
    let dir = Workdir::new("basic");
    let init = dir.file("init.txt", "6 3000 4\n6 5 9\n");
    let input = dir.file("input.txt", "1575424\n1575863\n1575864\n");

    let init = InitData::from_file(&init).unwrap();
    let mut vm = VMManager::from_init(&init, NUM_FRAMES, Disk::empty(), false).unwrap();
    let results = vm.translate_batch(&read_virtual_addresses(&input).unwrap()).unwrap();

    assert_eq!(results, vec![4608, 5047, -1]);
}
