use esp_idf_svc::hal::task::thread::ThreadSpawnConfiguration;
use esp_idf_svc::sys;

const PORT_TASK_STACK_BYTES: usize = 16 * 1024;
const PORT_TASK_PRIORITY: u8 = 5;

/// Log heap usage statistics and current task stack headroom.
pub fn log_heap(label: &str) {
    let free_heap = unsafe { sys::esp_get_free_heap_size() };
    let min_free = unsafe { sys::esp_get_minimum_free_heap_size() };
    let free_dma = unsafe { sys::heap_caps_get_free_size(sys::MALLOC_CAP_DMA) };
    let largest_dma = unsafe { sys::heap_caps_get_largest_free_block(sys::MALLOC_CAP_DMA) };
    let stack_hwm_words = unsafe { sys::uxTaskGetStackHighWaterMark(core::ptr::null_mut()) };
    let stack_hwm_bytes = (stack_hwm_words as usize) * core::mem::size_of::<sys::StackType_t>();
    log::info!(
        "[MEM] {}: free={} min_free={} free_dma={} largest_dma={} stack_hwm={}B",
        label,
        free_heap,
        min_free,
        free_dma,
        largest_dma,
        stack_hwm_bytes
    );
}

/// Configure pthread defaults for the port task spawned through `std::thread`.
pub fn configure_port_task() {
    let mut config = ThreadSpawnConfiguration::default();
    config.name = Some(b"gui\0");
    config.stack_size = PORT_TASK_STACK_BYTES;
    config.priority = PORT_TASK_PRIORITY;
    config.inherit = false;

    if let Err(err) = config.set() {
        log::warn!("Failed to configure port task: {}", err);
    } else {
        log::info!(
            "Configured port task: stack_size={} priority={}",
            config.stack_size,
            config.priority
        );
    }
}

/// Put pthread defaults back so later threads do not inherit the port task's.
pub fn reset_thread_defaults() {
    if let Err(err) = ThreadSpawnConfiguration::default().set() {
        log::warn!("Failed to reset pthread defaults: {}", err);
    }
}
