//! MainsMeter - Grid Frequency Display Firmware
//!
//! Firmware binary for a Raspberry Pi Pico W driving a TM1637 4-digit
//! LED display. Once a minute it fetches the current mains frequency
//! over TLS, extracts the value, and shows it with a blinking decimal
//! point as a liveness cue.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level as PinLevel, OutputOpenDrain, Pull};
use embassy_rp::peripherals::PIO0;
use embassy_time::{Delay, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use mainsmeter_core::debounce::Debouncer;
use mainsmeter_core::render::{Message, Renderer};
use mainsmeter_core::traits::Level;
use mainsmeter_drivers::{Button, Tm1637};

use crate::tls::TlsBuffers;

mod config;
mod net;
mod tasks;
mod tls;

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => embassy_rp::pio::InterruptHandler<PIO0>;
});

/// Concrete display type; embassy tasks cannot be generic over it
pub type DisplayDriver = Tm1637<OutputOpenDrain<'static>, OutputOpenDrain<'static>, Delay>;

// TLS buffers are too large for a task stack
static TLS_BUFFERS: StaticCell<TlsBuffers> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("MainsMeter firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // TM1637 on GPIO2 (CLK) / GPIO3 (DIO); both lines are open-drain
    // with external pull-ups and idle high
    let clk = OutputOpenDrain::new(p.PIN_2, PinLevel::High);
    let dio = OutputOpenDrain::new(p.PIN_3, PinLevel::High);
    let mut renderer = Renderer::new(Tm1637::new(clk, dio, Delay));

    // Sweep the brightness range so dead segments are visible at a glance
    if renderer.startup_animation(&mut Delay).await.is_err() {
        defmt::panic!("Display not responding");
    }
    info!("Display initialized");

    let _ = renderer.render_message(Message::Running);
    Timer::after_millis(1500).await;
    let _ = renderer.render_message(Message::Provisioning);

    // Mode-select button on GPIO14, active-low with the internal pull-up
    let button = Button::new(Input::new(p.PIN_14, Pull::Up));
    let mut debouncer = Debouncer::new(button, Delay);
    let reprovision = debouncer.read_stable_level().await == Level::Low;
    if reprovision {
        // Credential entry is handled by the provisioning app over USB;
        // here we only surface the request
        warn!("Reprovisioning requested, credentials are compiled in");
        let _ = renderer.render_message(Message::Wifi);
        Timer::after_millis(1500).await;
    }

    let pins = net::WifiPins {
        pwr: p.PIN_23,
        cs: p.PIN_25,
        dio: p.PIN_24,
        clk: p.PIN_29,
        pio: p.PIO0,
        dma: p.DMA_CH0,
    };
    let stack = net::start(spawner, pins).await;

    let _ = renderer.render_message(Message::Connected);
    Timer::after_millis(2000).await;

    let bufs = TLS_BUFFERS.init(TlsBuffers::new());
    spawner.spawn(tasks::poll_task(stack, renderer, bufs)).unwrap();

    info!("Poll task spawned, firmware running");

    // All work happens in spawned tasks from here on
    loop {
        Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
