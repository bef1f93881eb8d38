//! Wi-Fi and network stack bring-up (CYW43 radio on the Pico W)
//!
//! The poll pipeline only consumes the finished [`Stack`]; association,
//! DHCP, and the radio's background runners all live here.

use cyw43::JoinOptions;
use cyw43_pio::{PioSpi, DEFAULT_CLOCK_DIVIDER};
use defmt::*;
use embassy_executor::Spawner;
use embassy_net::{Config, Stack, StackResources};
use embassy_rp::clocks::RoscRng;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::{DMA_CH0, PIN_23, PIN_24, PIN_25, PIN_29, PIO0};
use embassy_rp::pio::Pio;
use embassy_time::Timer;
use rand_core::RngCore;
use static_cell::StaticCell;

use crate::config::{WIFI_PASS, WIFI_SSID};
use crate::Irqs;

// CYW43 firmware blobs, flashed separately to keep debug cycles fast:
//   probe-rs download 43439A0.bin --binary-format bin --chip RP2040 --base-address 0x101b0000
//   probe-rs download 43439A0_clm.bin --binary-format bin --chip RP2040 --base-address 0x101f8000
const CYW43_FW_ADDR: *const u8 = 0x101b_0000 as *const u8;
const CYW43_FW_LEN: usize = 230321;
const CYW43_CLM_ADDR: *const u8 = 0x101f_8000 as *const u8;
const CYW43_CLM_LEN: usize = 4752;

/// Pico W on-board radio wiring
pub struct WifiPins {
    pub pwr: PIN_23,
    pub cs: PIN_25,
    pub dio: PIN_24,
    pub clk: PIN_29,
    pub pio: PIO0,
    pub dma: DMA_CH0,
}

#[embassy_executor::task]
async fn cyw43_task(
    runner: cyw43::Runner<'static, Output<'static>, PioSpi<'static, PIO0, 0, DMA_CH0>>,
) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn net_task(mut runner: embassy_net::Runner<'static, cyw43::NetDriver<'static>>) -> ! {
    runner.run().await
}

/// Bring up the radio, join the network, and wait for a DHCP lease
pub async fn start(spawner: Spawner, pins: WifiPins) -> Stack<'static> {
    let fw = unsafe { core::slice::from_raw_parts(CYW43_FW_ADDR, CYW43_FW_LEN) };
    let clm = unsafe { core::slice::from_raw_parts(CYW43_CLM_ADDR, CYW43_CLM_LEN) };

    let pwr = Output::new(pins.pwr, Level::Low);
    let cs = Output::new(pins.cs, Level::High);
    let mut pio = Pio::new(pins.pio, Irqs);
    let spi = PioSpi::new(
        &mut pio.common,
        pio.sm0,
        DEFAULT_CLOCK_DIVIDER,
        pio.irq0,
        cs,
        pins.dio,
        pins.clk,
        pins.dma,
    );

    static STATE: StaticCell<cyw43::State> = StaticCell::new();
    let state = STATE.init(cyw43::State::new());
    let (net_device, mut control, runner) = cyw43::new(state, pwr, spi, fw).await;
    spawner.spawn(cyw43_task(runner)).unwrap();

    control.init(clm).await;
    control
        .set_power_management(cyw43::PowerManagementMode::PowerSave)
        .await;

    let mut rng = RoscRng;
    let seed = rng.next_u64();

    static RESOURCES: StaticCell<StackResources<8>> = StaticCell::new();
    let (stack, runner) = embassy_net::new(
        net_device,
        Config::dhcpv4(Default::default()),
        RESOURCES.init(StackResources::new()),
        seed,
    );
    spawner.spawn(net_task(runner)).unwrap();

    loop {
        match control
            .join(WIFI_SSID, JoinOptions::new(WIFI_PASS.as_bytes()))
            .await
        {
            Ok(()) => break,
            Err(err) => {
                warn!("Join failed with status {}, retrying", err.status);
                Timer::after_secs(1).await;
            }
        }
    }
    info!("Associated with {}", WIFI_SSID);

    stack.wait_config_up().await;
    info!("DHCP configuration acquired");

    stack
}
