//! Long-running firmware tasks

use defmt::*;
use embassy_net::Stack;
use embassy_rp::clocks::RoscRng;
use embassy_time::Delay;

use mainsmeter_core::config::WEB_HOST;
use mainsmeter_core::poll::PollLoop;
use mainsmeter_core::render::Renderer;

use crate::tls::{TlsBuffers, TlsChannel};
use crate::DisplayDriver;

/// Fetch, extract, and render forever; one cycle per minute
#[embassy_executor::task]
pub async fn poll_task(
    stack: Stack<'static>,
    renderer: Renderer<DisplayDriver>,
    bufs: &'static mut TlsBuffers,
) -> ! {
    let mut poll = PollLoop::new(renderer, Delay);

    loop {
        // Hold off while the link or lease is down; the cycle itself
        // tolerates fetch failures
        stack.wait_config_up().await;

        let channel = TlsChannel::new(stack, RoscRng, WEB_HOST, &mut *bufs);
        match poll.run_cycle(channel).await {
            Ok(Some(freq)) => debug!("Cycle complete: {} Hz", freq),
            Ok(None) => debug!("Cycle complete without a sample"),
            Err(_) => {
                // A failed display write means the bus is gone; there is
                // nothing useful left to show
                defmt::panic!("Display write failed");
            }
        }
    }
}
