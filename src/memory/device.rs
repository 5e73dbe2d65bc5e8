//! Memory-mapped device trait.

/// A device occupying a fixed window of the I/O address space.
pub trait Device {
    /// Stable name, used in diagnostics.
    fn name(&self) -> &'static str;

    /// `(base, size)` in bytes, base relative to the full address space.
    fn address_range(&self) -> (u32, u32);

    /// Reads the register at `offset` bytes from the device base.
    fn read(&mut self, offset: u32) -> u32;

    /// Writes the register at `offset` bytes from the device base.
    fn write(&mut self, offset: u32, val: u32);

    /// Installs the console-output sink, invoked with the low byte of
    /// every CONSOLE_OUT write.
    fn set_output_callback(&mut self, _callback: Box<dyn FnMut(u32)>) {}

    /// Installs the interrupt callback, invoked with the pending bits
    /// whenever `status & mask` becomes non-zero.
    fn set_interrupt_callback(&mut self, _callback: Box<dyn FnMut(u32)>) {}

    /// Appends a byte to this device's console input queue, if it has
    /// one.
    fn push_console_input(&mut self, _byte: u8) {}

    /// Appends a scancode to this device's keyboard input queue, if it
    /// has one.
    fn push_keyboard_input(&mut self, _code: u32) {}

    /// Advances device-internal state by `delta_ms` milliseconds.
    /// Only the timer device does anything with this.
    fn tick(&mut self, _delta_ms: u32) {}
}
