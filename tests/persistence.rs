#![allow(missing_docs)]
//! Host-level tests for persisting a screen and for the flash record store.

use embedded_storage::nor_flash::{NorFlash, NorFlashErrorKind, ReadNorFlash};
use led_screen::Error;
use led_screen::refresh::{ScreenConfig, ScreenShared};
use led_screen::screen::{FULL_BRIGHTNESS, LedStatus, OBEGRAENSAD_16X16, Restored, Rotation};
use led_screen::storage::{FlashStorage, MAX_PAYLOAD_SIZE, MemoryFlash, Storage};

type TestStorage = FlashStorage<MemoryFlash<4096>>;

/// Offset of the "data" record written by `persist`: the last two 1 KiB blocks start
/// at 2048 and the buffer is always saved before brightness.
const DATA_BLOCK: usize = 2048;
const RECORD_HEADER: usize = 10;

fn storage() -> TestStorage {
    FlashStorage::at_end(MemoryFlash::new(), 2).expect("two blocks fit")
}

fn config() -> ScreenConfig<16, 16> {
    ScreenConfig::new(OBEGRAENSAD_16X16)
}

#[test]
fn state_survives_a_power_cycle() {
    let mut storage = storage();
    let before = ScreenShared::new();
    let (mut screen, _refresher, restored) =
        before.setup(config(), &mut storage, ()).expect("first setup");
    assert_eq!(restored, Restored::Defaults);

    screen.draw_rectangle(2, 3, 5, 4, true, LedStatus::On, 180);
    screen.set_pixel(15, 15, 1, 9);
    screen.set_brightness(77);
    screen.persist(&mut storage).expect("flash works");

    let after = ScreenShared::new();
    let (restored_screen, _refresher, restored) =
        after.setup(config(), &mut storage, ()).expect("fresh setup");
    assert_eq!(restored, Restored::FromStorage);
    assert_eq!(restored_screen.render_buffer(), screen.render_buffer());
    assert_eq!(restored_screen.current_brightness(), 77);
    assert_eq!(after.snapshot().brightness, 77);
    assert_eq!(after.snapshot().frame, before.snapshot().frame);
}

#[test]
fn rotation_is_not_persisted() {
    let mut storage = storage();
    let before = ScreenShared::new();
    let (mut screen, _refresher) = before.split(config(), ()).expect("first split");
    screen.set_pixel(0, 0, 1, FULL_BRIGHTNESS);
    screen.set_rotation(Rotation::Deg90).expect("square panel");
    screen.persist(&mut storage).expect("flash works");

    let after = ScreenShared::new();
    let (restored_screen, _refresher, _) =
        after.setup(config(), &mut storage, ()).expect("fresh setup");
    assert_eq!(restored_screen.current_rotation(), Rotation::Deg0);
    assert_eq!(
        restored_screen
            .rotated_render_buffer()
            .lit_addresses()
            .collect::<Vec<_>>(),
        vec![0x0f]
    );
}

#[test]
fn empty_storage_uses_configured_defaults() {
    let mut storage = storage();
    let shared = ScreenShared::new();
    let (screen, _refresher, restored) = shared
        .setup(config().with_default_brightness(99), &mut storage, ())
        .expect("first setup");

    assert_eq!(restored, Restored::Defaults);
    assert_eq!(screen.current_brightness(), 99);
    assert_eq!(screen.render_buffer().lit_count(), 0);
    assert_eq!(shared.snapshot().brightness, 99);
}

#[test]
fn missing_data_record_falls_back_to_defaults() {
    let mut storage = storage();
    storage.save("brightness", &[12]).expect("flash works");

    let shared = ScreenShared::new();
    let (screen, _refresher, restored) = shared
        .setup(config().with_default_brightness(99), &mut storage, ())
        .expect("first setup");
    assert_eq!(restored, Restored::Defaults);
    assert_eq!(screen.current_brightness(), 99);
}

#[test]
fn corrupted_record_falls_back_to_defaults() {
    let mut storage = storage();
    let before = ScreenShared::new();
    let (mut screen, _refresher) = before.split(config(), ()).expect("first split");
    screen.draw_full_line(5, led_screen::screen::Orientation::Horizontal, 200);
    screen.persist(&mut storage).expect("flash works");

    storage.flash_mut().as_bytes_mut()[DATA_BLOCK + RECORD_HEADER + 5] ^= 0x01;
    assert_eq!(
        storage.load("data", &mut [0_u8; 256]),
        Err(Error::StorageCorrupted)
    );

    let after = ScreenShared::new();
    let (restored_screen, _refresher, restored) =
        after.setup(config(), &mut storage, ()).expect("fresh setup");
    assert_eq!(restored, Restored::Defaults);
    assert_eq!(restored_screen.render_buffer().lit_count(), 0);
    assert_eq!(after.snapshot().frame.lit_count(), 0);
}

#[test]
fn wrong_sized_data_falls_back_to_defaults() {
    let mut storage = storage();
    storage.save("brightness", &[50]).expect("flash works");
    storage.save("data", &[FULL_BRIGHTNESS; 10]).expect("flash works");

    let shared = ScreenShared::new();
    let (screen, _refresher, restored) =
        shared.setup(config(), &mut storage, ()).expect("first setup");
    assert_eq!(restored, Restored::Defaults);
    assert_eq!(screen.render_buffer().lit_count(), 0);

    storage.save("data", &[FULL_BRIGHTNESS; 300]).expect("flash works");
    let shared = ScreenShared::new();
    let (_screen, _refresher, restored) =
        shared.setup(config(), &mut storage, ()).expect("second setup");
    assert_eq!(restored, Restored::Defaults);
}

#[test]
fn failed_persist_keeps_the_screen_usable() {
    let mut storage = storage();
    let shared = ScreenShared::new();
    let (mut screen, _refresher) = shared.split(config(), ()).expect("first split");
    screen.set_pixel(4, 4, 1, FULL_BRIGHTNESS);
    let drawn = *screen.render_buffer();

    storage.flash_mut().set_fail_writes(true);
    assert_eq!(
        screen.persist(&mut storage),
        Err(Error::Flash(NorFlashErrorKind::Other))
    );
    assert_eq!(*screen.render_buffer(), drawn);

    storage.flash_mut().set_fail_writes(false);
    screen.persist(&mut storage).expect("flash works again");
}

/// Forwards to a flash store but refuses to save one key.
struct RefusingKey<'a> {
    inner: &'a mut TestStorage,
    refused: &'static str,
}

impl Storage for RefusingKey<'_> {
    fn load(&mut self, key: &str, buf: &mut [u8]) -> led_screen::Result<Option<usize>> {
        self.inner.load(key, buf)
    }

    fn save(&mut self, key: &str, bytes: &[u8]) -> led_screen::Result<()> {
        if key == self.refused {
            return Err(Error::StorageFull);
        }
        self.inner.save(key, bytes)
    }
}

#[test]
fn failed_buffer_save_keeps_the_previous_brightness() {
    let mut storage = storage();
    let before = ScreenShared::new();
    let (mut screen, _refresher) = before.split(config(), ()).expect("first split");
    screen.draw_full_line(3, led_screen::screen::Orientation::Vertical, 120);
    screen.set_brightness(10);
    screen.persist(&mut storage).expect("flash works");
    let persisted = *screen.render_buffer();

    screen.clear();
    screen.set_brightness(200);
    let mut refusing = RefusingKey {
        inner: &mut storage,
        refused: "data",
    };
    assert_eq!(screen.persist(&mut refusing), Err(Error::StorageFull));

    let after = ScreenShared::new();
    let (restored_screen, _refresher, restored) =
        after.setup(config(), &mut storage, ()).expect("fresh setup");
    assert_eq!(restored, Restored::FromStorage);
    assert_eq!(restored_screen.current_brightness(), 10);
    assert_eq!(*restored_screen.render_buffer(), persisted);
}

#[test]
fn records_overwrite_in_place() {
    let mut storage = storage();
    storage.save("brightness", &[1]).expect("flash works");
    storage.save("brightness", &[2]).expect("flash works");
    storage.save("data", &[3, 4, 5]).expect("flash works");

    let mut buf = [0_u8; 4];
    assert_eq!(storage.load("brightness", &mut buf), Ok(Some(1)));
    assert_eq!(buf[0], 2);
    assert_eq!(storage.load("data", &mut buf), Ok(Some(3)));
    assert_eq!(&buf[..3], &[3, 4, 5]);
    assert_eq!(storage.flash_mut().erase_count(), 3);
}

#[test]
fn every_key_needs_its_own_block() {
    let mut storage = FlashStorage::at_end(MemoryFlash::<4096>::new(), 1).expect("one block");
    assert_eq!(storage.blocks(), 1);
    storage.save("brightness", &[1]).expect("first key fits");
    assert_eq!(storage.save("data", &[1]), Err(Error::StorageFull));

    storage.clear("brightness").expect("flash works");
    assert_eq!(storage.load("brightness", &mut [0_u8; 1]), Ok(None));
    storage.save("data", &[1]).expect("block was freed");
}

#[test]
fn payload_must_fit_one_block() {
    let mut storage = storage();
    assert_eq!(
        storage.save("data", &[0; 2000]),
        Err(Error::PayloadTooLarge(2000))
    );
    let largest = 1024 - RECORD_HEADER - 4;
    assert!(largest < MAX_PAYLOAD_SIZE);
    storage.save("data", &vec![7; largest]).expect("exactly fills a block");
    let mut buf = vec![0_u8; largest];
    assert_eq!(storage.load("data", &mut buf), Ok(Some(largest)));
    assert!(buf.iter().all(|&byte| byte == 7));
}

#[test]
fn short_load_buffer_is_reported() {
    let mut storage = storage();
    storage.save("data", &[1, 2, 3]).expect("flash works");
    assert_eq!(
        storage.load("data", &mut [0_u8; 2]),
        Err(Error::BufferLength {
            expected: 3,
            actual: 2
        })
    );
}

#[test]
fn region_must_be_block_aligned_and_inside_flash() {
    assert!(matches!(
        FlashStorage::new(MemoryFlash::<4096>::new(), 100, 1),
        Err(Error::StorageMisaligned)
    ));
    assert!(matches!(
        FlashStorage::new(MemoryFlash::<4096>::new(), 3072, 2),
        Err(Error::IndexOutOfBounds)
    ));
    assert!(matches!(
        FlashStorage::at_end(MemoryFlash::<4096>::new(), 5),
        Err(Error::IndexOutOfBounds)
    ));
    let storage = FlashStorage::new(MemoryFlash::<4096>::new(), 1024, 3).expect("fits exactly");
    assert_eq!(storage.blocks(), 3);
}

#[test]
fn record_layout_is_stable() {
    let mut storage = storage();
    storage.save("brightness", &[0xAB]).expect("flash works");
    let flash = storage.into_inner();
    let block = &flash.as_bytes()[2048..2048 + 16];

    assert_eq!(&block[0..4], &0x5343_524E_u32.to_le_bytes());
    // FNV-1a of "brightness".
    let hash = "brightness".bytes().fold(2_166_136_261_u32, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(16_777_619)
    });
    assert_eq!(&block[4..8], &hash.to_le_bytes());
    assert_eq!(&block[8..10], &[1, 0]);
    assert_eq!(block[10], 0xAB);
    assert_eq!(&block[11..15], &crc32fast::hash(&block[..11]).to_le_bytes());
    assert_eq!(block[15], 0xFF);
}

#[test]
fn memory_flash_behaves_like_nor() {
    let mut flash = MemoryFlash::<4096>::new();
    assert_eq!(flash.capacity(), 4096);

    flash.write(0, &[0b1100_1100; 4]).expect("aligned write");
    flash.write(0, &[0b1010_1010; 4]).expect("aligned write");
    let mut bytes = [0_u8; 4];
    flash.read(0, &mut bytes).expect("in range");
    assert_eq!(bytes, [0b1000_1000; 4]);

    assert_eq!(flash.write(2, &[0; 4]), Err(NorFlashErrorKind::NotAligned));
    assert_eq!(flash.erase(0, 512), Err(NorFlashErrorKind::NotAligned));
    assert_eq!(flash.read(4095, &mut [0; 2]), Err(NorFlashErrorKind::OutOfBounds));

    flash.erase(0, 1024).expect("one block");
    flash.read(0, &mut bytes).expect("in range");
    assert_eq!(bytes, [0xFF; 4]);
    assert_eq!(flash.erase_count(), 1);
}
