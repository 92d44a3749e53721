//! Command-layer tests against scripted I2C transactions.

use ds2482::{Channel, DeviceConfiguration, Ds2482, Ds2482Error, SearchState};
use embedded_hal_mock::eh1::delay::NoopDelay;
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

const ADDR: u8 = 0x18;

fn wait_ready_with_pointer() -> [I2cTransaction; 2] {
    [
        I2cTransaction::write(ADDR, vec![0xe1, 0xf0]),
        I2cTransaction::read(ADDR, vec![0x00]),
    ]
}

#[test]
fn busy_wait_times_out_after_fixed_budget() {
    // The status source never clears the busy bit: one pointer write, then
    // the initial poll plus the 20-poll budget, then the error.
    let mut expectations = vec![I2cTransaction::write(ADDR, vec![0xe1, 0xf0])];
    expectations.extend((0..21).map(|_| I2cTransaction::read(ADDR, vec![0x01])));
    let mut i2c = I2cMock::new(&expectations);
    let mut bridge = Ds2482::new(i2c.clone(), NoopDelay);
    assert!(matches!(
        bridge.onewire_reset(),
        Err(Ds2482Error::Timeout)
    ));
    i2c.done();
}

#[test]
fn bus_reset_reports_short_circuit() {
    let mut expectations = wait_ready_with_pointer().to_vec();
    expectations.push(I2cTransaction::write(ADDR, vec![0xb4]));
    expectations.push(I2cTransaction::read(ADDR, vec![0x06])); // PPD + SD
    let mut i2c = I2cMock::new(&expectations);
    let mut bridge = Ds2482::new(i2c.clone(), NoopDelay);
    assert!(matches!(
        bridge.onewire_reset(),
        Err(Ds2482Error::ShortCircuit)
    ));
    i2c.done();
}

#[test]
fn bus_reset_reports_missing_presence() {
    let mut expectations = wait_ready_with_pointer().to_vec();
    expectations.push(I2cTransaction::write(ADDR, vec![0xb4]));
    expectations.push(I2cTransaction::read(ADDR, vec![0x00])); // no PPD
    let mut i2c = I2cMock::new(&expectations);
    let mut bridge = Ds2482::new(i2c.clone(), NoopDelay);
    assert!(matches!(
        bridge.onewire_reset(),
        Err(Ds2482Error::NoDevicePresent)
    ));
    i2c.done();
}

#[test]
fn bus_reset_succeeds_on_presence() {
    let mut expectations = wait_ready_with_pointer().to_vec();
    expectations.push(I2cTransaction::write(ADDR, vec![0xb4]));
    expectations.push(I2cTransaction::read(ADDR, vec![0x02])); // PPD
    let mut i2c = I2cMock::new(&expectations);
    let mut bridge = Ds2482::new(i2c.clone(), NoopDelay);
    let status = bridge.onewire_reset().unwrap();
    assert!(status.present_pulse_detect());
    assert!(!status.short_detect());
    i2c.done();
}

#[test]
fn configure_writes_complement_nibble_and_verifies_echo() {
    let mut expectations = wait_ready_with_pointer().to_vec();
    expectations.push(I2cTransaction::write_read(
        ADDR,
        vec![0xd2, 0xe1], // APU set: upper nibble is the complement
        vec![0x01],       // echo reads back without the complement
    ));
    let mut i2c = I2cMock::new(&expectations);
    let mut bridge = Ds2482::new(i2c.clone(), NoopDelay);
    bridge
        .configure(DeviceConfiguration::new().with_active_pullup(true))
        .unwrap();
    i2c.done();
}

#[test]
fn configure_rejects_bad_echo() {
    let mut expectations = wait_ready_with_pointer().to_vec();
    expectations.push(I2cTransaction::write_read(
        ADDR,
        vec![0xd2, 0xe1],
        vec![0x00], // bridge did not take the configuration
    ));
    let mut i2c = I2cMock::new(&expectations);
    let mut bridge = Ds2482::new(i2c.clone(), NoopDelay);
    assert!(matches!(
        bridge.configure(DeviceConfiguration::new().with_active_pullup(true)),
        Err(Ds2482Error::ConfigurationMismatch)
    ));
    i2c.done();
}

#[test]
fn select_channel_verifies_asymmetric_read_back() {
    let mut expectations = wait_ready_with_pointer().to_vec();
    expectations.push(I2cTransaction::write_read(
        ADDR,
        vec![0xc3, 0xc3], // command byte, then the IO3 write code
        vec![0xa3],       // expected IO3 read-back code
    ));
    let mut i2c = I2cMock::new(&expectations);
    let mut bridge = Ds2482::new(i2c.clone(), NoopDelay);
    assert_eq!(bridge.select_channel(Channel::Io3).unwrap(), 0xa3);
    // Selecting the cached channel again produces no bus traffic.
    assert_eq!(bridge.select_channel(Channel::Io3).unwrap(), 0xa3);
    assert_eq!(bridge.channel(), Channel::Io3);
    i2c.done();
}

#[test]
fn select_channel_rejects_bad_read_back() {
    let mut expectations = wait_ready_with_pointer().to_vec();
    expectations.push(I2cTransaction::write_read(
        ADDR,
        vec![0xc3, 0xe1],
        vec![0xb8], // IO1 expects 0xb1
    ));
    let mut i2c = I2cMock::new(&expectations);
    let mut bridge = Ds2482::new(i2c.clone(), NoopDelay);
    assert!(matches!(
        bridge.select_channel(Channel::Io1),
        Err(Ds2482Error::ChannelSelectionFailed)
    ));
    // The cached channel is unchanged after a failed selection.
    assert_eq!(bridge.channel(), Channel::Io0);
    i2c.done();
}

#[test]
fn device_reset_restores_default_channel() {
    let expectations = [
        // Select IO2 first.
        I2cTransaction::write(ADDR, vec![0xe1, 0xf0]),
        I2cTransaction::read(ADDR, vec![0x00]),
        I2cTransaction::write_read(ADDR, vec![0xc3, 0xd2], vec![0xaa]),
        // Device reset: command, then one status poll.
        I2cTransaction::write(ADDR, vec![0xf0]),
        I2cTransaction::read(ADDR, vec![0x10]), // RST set
    ];
    let mut i2c = I2cMock::new(&expectations);
    let mut bridge = Ds2482::new(i2c.clone(), NoopDelay);
    bridge.select_channel(Channel::Io2).unwrap();
    let status = bridge.device_reset().unwrap();
    assert!(status.device_reset());
    assert_eq!(bridge.channel(), Channel::Io0);
    // IO0 is the cached default again, so no traffic is needed.
    assert_eq!(bridge.select_channel(Channel::Io0).unwrap(), 0xb8);
    i2c.done();
}

#[test]
fn write_byte_runs_busy_waits_around_the_write() {
    let mut expectations = wait_ready_with_pointer().to_vec();
    expectations.push(I2cTransaction::write(ADDR, vec![0xa5, 0x55]));
    expectations.push(I2cTransaction::read(ADDR, vec![0x00]));
    let mut i2c = I2cMock::new(&expectations);
    let mut bridge = Ds2482::new(i2c.clone(), NoopDelay);
    bridge.write_byte(0x55).unwrap();
    i2c.done();
}

#[test]
fn read_byte_fetches_the_data_register() {
    let mut expectations = wait_ready_with_pointer().to_vec();
    expectations.push(I2cTransaction::write(ADDR, vec![0x96]));
    expectations.push(I2cTransaction::read(ADDR, vec![0x00]));
    expectations.push(I2cTransaction::write_read(
        ADDR,
        vec![0xe1, 0xe1],
        vec![0xab],
    ));
    let mut i2c = I2cMock::new(&expectations);
    let mut bridge = Ds2482::new(i2c.clone(), NoopDelay);
    assert_eq!(bridge.read_byte().unwrap(), 0xab);
    i2c.done();
}

#[test]
fn single_bit_reports_the_sampled_slot() {
    let mut expectations = wait_ready_with_pointer().to_vec();
    expectations.push(I2cTransaction::write(ADDR, vec![0x87, 0x80]));
    expectations.push(I2cTransaction::read(ADDR, vec![0x20])); // SBR
    let mut i2c = I2cMock::new(&expectations);
    let mut bridge = Ds2482::new(i2c.clone(), NoopDelay);
    assert!(bridge.single_bit(true).unwrap());
    i2c.done();
}

#[test]
fn triplet_returns_the_raw_status() {
    let mut expectations = wait_ready_with_pointer().to_vec();
    expectations.push(I2cTransaction::write(ADDR, vec![0x78, 0x00]));
    expectations.push(I2cTransaction::read(ADDR, vec![0xa0])); // SBR + DIR
    let mut i2c = I2cMock::new(&expectations);
    let mut bridge = Ds2482::new(i2c.clone(), NoopDelay);
    let status = bridge.triplet(false).unwrap();
    assert!(status.single_bit_result());
    assert!(!status.triplet_second_bit());
    assert!(status.branch_dir_taken());
    i2c.done();
}

#[test]
fn search_pass_rejects_impossible_triplet_response() {
    let mut expectations = Vec::new();
    // Bus reset with presence.
    expectations.extend(wait_ready_with_pointer());
    expectations.push(I2cTransaction::write(ADDR, vec![0xb4]));
    expectations.push(I2cTransaction::read(ADDR, vec![0x02]));
    // Search ROM command byte.
    expectations.extend(wait_ready_with_pointer());
    expectations.push(I2cTransaction::write(ADDR, vec![0xa5, 0xf0]));
    expectations.push(I2cTransaction::read(ADDR, vec![0x00]));
    // First triplet answers with both read slots set.
    expectations.extend(wait_ready_with_pointer());
    expectations.push(I2cTransaction::write(ADDR, vec![0x78, 0x80]));
    expectations.push(I2cTransaction::read(ADDR, vec![0x60])); // SBR + TSB
    let mut i2c = I2cMock::new(&expectations);
    let mut bridge = Ds2482::new(i2c.clone(), NoopDelay);
    let mut state = SearchState::new();
    assert!(matches!(
        bridge.search_pass(&mut state),
        Err(Ds2482Error::BadSearchResult)
    ));
    // A failed pass leaves the state untouched.
    assert_eq!(state, SearchState::new());
    i2c.done();
}
